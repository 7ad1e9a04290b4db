use std::sync::Arc;

use crate::core::{
    criteria::DiscoveryCriteria,
    filters::{build_store_query, filter_within_radius},
};
use crate::models::Restaurant;
use crate::services::store::{decode_all, Collection, DocumentStore, StoreError};

/// Restaurant discovery pipeline
///
/// # Pipeline Stages
/// 1. Non-geographic constraints, evaluated by the store
/// 2. Radius post-filter over the candidate set, when a center and radius are given
///
/// Results keep storage order. Nothing here mutates shared state, so one instance
/// serves every request.
#[derive(Clone)]
pub struct RestaurantDiscovery {
    store: Arc<dyn DocumentStore>,
}

impl RestaurantDiscovery {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Find restaurants matching every supplied constraint
    pub async fn discover(&self, criteria: &DiscoveryCriteria) -> Result<Vec<Restaurant>, StoreError> {
        let query = build_store_query(criteria);
        let documents = self.store.find(Collection::Restaurants, &query).await?;
        let candidates: Vec<Restaurant> = decode_all(documents)?;

        let Some(radius) = &criteria.radius else {
            tracing::debug!("Discovery returned {} restaurants", candidates.len());
            return Ok(candidates);
        };

        let total_candidates = candidates.len();
        let restaurants = filter_within_radius(candidates, radius);

        tracing::debug!(
            "Discovery kept {} of {} candidates within {}m of ({}, {})",
            restaurants.len(),
            total_candidates,
            radius.radius_m,
            radius.latitude,
            radius.longitude
        );

        Ok(restaurants)
    }
}

use crate::core::criteria::{DiscoveryCriteria, GeoRadius};
use crate::core::distance::haversine_distance;
use crate::models::Restaurant;
use crate::services::store::StoreQuery;

/// Build the store query for every non-geographic constraint
///
/// This is stage 1 of discovery: the store narrows the candidate set before any
/// distance is computed.
pub fn build_store_query(criteria: &DiscoveryCriteria) -> StoreQuery {
    let mut query = StoreQuery::new();

    if let Some(location) = &criteria.location {
        query = query.contains_ignore_case("location", location.as_str());
    }
    if let Some(cuisine) = &criteria.cuisine {
        query = query.equals("cuisine", cuisine.as_str());
    }
    if let Some(price_range) = &criteria.price_range {
        query = query.equals("priceRange", price_range.as_str());
    }
    if let Some(min_rating) = criteria.min_rating {
        query = query.at_least("rating", min_rating);
    }

    // Flags only ever require `true`
    let flags = [
        ("vegetarian", criteria.vegetarian),
        ("vegan", criteria.vegan),
        ("glutenFree", criteria.gluten_free),
        ("openNow", criteria.open_now),
    ];
    for (field, flag) in flags {
        if flag == Some(true) {
            query = query.equals(field, true);
        }
    }

    query
}

/// Check if a restaurant lies within the radius
///
/// Restaurants without both coordinates are never within any radius.
#[inline]
pub fn is_within_radius(restaurant: &Restaurant, radius: &GeoRadius) -> bool {
    let Some((lat, lng)) = restaurant.position() else {
        return false;
    };

    haversine_distance(radius.latitude, radius.longitude, lat, lng) <= radius.radius_m
}

/// Stage 2: keep candidates within the radius, preserving order
pub fn filter_within_radius(candidates: Vec<Restaurant>, radius: &GeoRadius) -> Vec<Restaurant> {
    candidates
        .into_iter()
        .filter(|restaurant| is_within_radius(restaurant, radius))
        .collect()
}

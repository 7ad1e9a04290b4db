use actix_web::{web, HttpResponse};

use crate::core::DiscoveryCriteria;
use crate::error::ApiError;
use crate::models::{CreateRestaurantRequest, DiscoveryParams, Restaurant};
use crate::routes::{AppState, AuthUser};
use crate::services::store::{decode, encode, Collection};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/restaurants", web::get().to(discover_restaurants))
        .route("/restaurants", web::post().to(create_restaurant))
        .route("/restaurants/{id}", web::get().to(get_restaurant));
}

/// Restaurant discovery endpoint
///
/// GET /api/v1/restaurants
///
/// Query parameters (all optional):
/// `location`, `cuisine`, `priceRange`, `minRating`, `vegetarian`, `vegan`,
/// `glutenFree`, `openNow`, `radius` (meters), `latitude`, `longitude`
async fn discover_restaurants(
    state: web::Data<AppState>,
    params: web::Query<DiscoveryParams>,
) -> Result<HttpResponse, ApiError> {
    let criteria = DiscoveryCriteria::from_params(&params)?;

    let restaurants = state.discovery.discover(&criteria).await.map_err(|e| {
        tracing::error!("Restaurant discovery failed: {}", e);
        ApiError::from(e)
    })?;

    tracing::info!("Returning {} restaurants", restaurants.len());

    Ok(HttpResponse::Ok().json(restaurants))
}

/// GET /api/v1/restaurants/{id}
async fn get_restaurant(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let doc = state
        .store
        .find_by_id(Collection::Restaurants, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Restaurant", &id))?;

    let restaurant: Restaurant = decode(doc)?;
    Ok(HttpResponse::Ok().json(restaurant))
}

/// Insert a restaurant as given; the body's types are the only validation
///
/// POST /api/v1/restaurants
async fn create_restaurant(
    state: web::Data<AppState>,
    _auth: AuthUser,
    req: web::Json<CreateRestaurantRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = req.into_inner();

    let restaurant = Restaurant {
        id: uuid::Uuid::new_v4().to_string(),
        name: req.name,
        cuisine: req.cuisine,
        price_range: req.price_range,
        rating: req.rating,
        location: req.location,
        image: req.image,
        vegetarian: req.vegetarian,
        vegan: req.vegan,
        gluten_free: req.gluten_free,
        open_now: req.open_now,
        coordinates: req.coordinates,
    };

    state
        .store
        .insert_one(Collection::Restaurants, &restaurant.id, encode(&restaurant)?)
        .await?;

    tracing::info!("Created restaurant {} ({})", restaurant.id, restaurant.name);

    Ok(HttpResponse::Created().json(restaurant))
}

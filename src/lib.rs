//! Dine Match - backend service for the Dine Match restaurant social app
//!
//! Users register, discover restaurants by cuisine, price, rating, dietary flags and
//! distance, book tables, chat with each other and receive push notifications.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{haversine_distance, DiscoveryCriteria, RestaurantDiscovery};
pub use error::ApiError;
pub use models::{Restaurant, Coordinates, DiscoveryParams};
pub use routes::AppState;

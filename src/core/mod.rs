// Core discovery exports
pub mod criteria;
pub mod discovery;
pub mod distance;
pub mod filters;

pub use criteria::{CriteriaError, DiscoveryCriteria, GeoRadius};
pub use discovery::RestaurantDiscovery;
pub use distance::haversine_distance;
pub use filters::{build_store_query, filter_within_radius, is_within_radius};

// Route exports
pub mod extract;
pub mod health;
pub mod messages;
pub mod notifications;
pub mod reservations;
pub mod restaurants;
pub mod users;

use actix_web::web;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::RestaurantDiscovery;
use crate::services::{DocumentStore, Notifier, PushSender, TokenService};

pub use extract::AuthUser;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub discovery: RestaurantDiscovery,
    pub notifier: Notifier,
    pub tokens: Arc<TokenService>,
    /// Held from the email uniqueness check until the new user is stored
    pub registrations: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        push: Arc<dyn PushSender>,
        tokens: TokenService,
    ) -> Self {
        Self {
            discovery: RestaurantDiscovery::new(store.clone()),
            notifier: Notifier::new(store.clone(), push),
            tokens: Arc::new(tokens),
            registrations: Arc::new(Mutex::new(())),
            store,
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(health::configure)
            .configure(users::configure)
            .configure(restaurants::configure)
            .configure(reservations::configure)
            .configure(messages::configure)
            .configure(notifications::configure),
    );
}

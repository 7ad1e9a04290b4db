use serde::{Deserialize, Serialize};
use crate::models::domain::{Notification, PublicUser};
use crate::services::push::PushTicket;

/// Returned by register and login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Outcome of notifying a single user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub notification: Notification,
    /// `None` when the user has no push token registered
    pub ticket: Option<PushTicket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendNotificationResponse {
    pub deliveries: Vec<Delivery>,
    pub delivered: usize,
    pub failed: usize,
}

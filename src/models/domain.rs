use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Geographic position of a restaurant
///
/// Both components are optional in stored documents; a restaurant only takes part
/// in radius filtering when both are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }
}

/// Restaurant record as stored in the restaurants collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cuisine: String,
    #[serde(rename = "priceRange", default)]
    pub price_range: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub vegetarian: bool,
    #[serde(default)]
    pub vegan: bool,
    #[serde(rename = "glutenFree", default)]
    pub gluten_free: bool,
    #[serde(rename = "openNow", default)]
    pub open_now: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl Restaurant {
    /// Latitude/longitude pair, only when both components are present
    pub fn position(&self) -> Option<(f64, f64)> {
        let coords = self.coordinates?;
        Some((coords.latitude?, coords.longitude?))
    }
}

/// Registered app user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "passwordHash")]
    pub password_hash: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(rename = "pushToken", default)]
    pub push_token: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// User as returned by the API, without credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
    #[serde(rename = "hasPushToken")]
    pub has_push_token: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            bio: user.bio,
            has_push_token: user.push_token.is_some(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

/// Table reservation made by a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "restaurantId")]
    pub restaurant_id: String,
    #[serde(rename = "reservedFor")]
    pub reserved_for: DateTime<Utc>,
    #[serde(rename = "partySize")]
    pub party_size: u8,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: ReservationStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Direct message between two users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    #[serde(rename = "senderId")]
    pub sender_id: String,
    #[serde(rename = "recipientId")]
    pub recipient_id: String,
    pub content: String,
    #[serde(rename = "reservationId", default)]
    pub reservation_id: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Reservation,
    Message,
    System,
}

/// In-app notification, persisted whether or not a push was delivered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub read: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::Coordinates;

/// Raw query string of the restaurant discovery endpoint
///
/// Every value stays a string here; parsing happens in
/// [`DiscoveryCriteria`](crate::core::DiscoveryCriteria).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryParams {
    pub location: Option<String>,
    pub cuisine: Option<String>,
    pub price_range: Option<String>,
    pub min_rating: Option<String>,
    pub vegetarian: Option<String>,
    pub vegan: Option<String>,
    pub gluten_free: Option<String>,
    pub open_now: Option<String>,
    pub radius: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PushTokenRequest {
    #[validate(length(min = 1))]
    #[serde(rename = "pushToken")]
    pub push_token: String,
}

/// Body of `POST /restaurants`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRestaurantRequest {
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
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateReservationRequest {
    #[validate(length(min = 1))]
    #[serde(rename = "restaurantId")]
    pub restaurant_id: String,
    #[serde(rename = "reservedFor")]
    pub reserved_for: DateTime<Utc>,
    #[validate(range(min = 1, max = 20))]
    #[serde(rename = "partySize")]
    pub party_size: u8,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1))]
    #[serde(rename = "recipientId")]
    pub recipient_id: String,
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
    #[serde(rename = "reservationId", default)]
    pub reservation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationQuery {
    pub with: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendNotificationRequest {
    #[validate(length(min = 1, max = 100))]
    #[serde(rename = "userIds")]
    pub user_ids: Vec<String>,
    #[validate(length(min = 1, max = 120))]
    pub title: String,
    #[validate(length(min = 1, max = 1000))]
    pub body: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_params_use_camel_case() {
        let params: DiscoveryParams = serde_json::from_value(serde_json::json!({
            "priceRange": "$$",
            "minRating": "4.5",
            "glutenFree": "true",
            "openNow": "false"
        }))
        .unwrap();

        assert_eq!(params.price_range.as_deref(), Some("$$"));
        assert_eq!(params.min_rating.as_deref(), Some("4.5"));
        assert_eq!(params.gluten_free.as_deref(), Some("true"));
        assert_eq!(params.open_now.as_deref(), Some("false"));
        assert!(params.radius.is_none());
    }

    #[test]
    fn test_register_request_validation() {
        let request = RegisterRequest {
            name: "Ana".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            bio: None,
        };

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_party_size_bounds() {
        let mut request = CreateReservationRequest {
            restaurant_id: "r1".to_string(),
            reserved_for: Utc::now(),
            party_size: 0,
            notes: None,
        };
        assert!(request.validate().is_err());

        request.party_size = 4;
        assert!(request.validate().is_ok());
    }
}

// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    ChatMessage, Coordinates, Notification, NotificationKind, PublicUser, Reservation,
    ReservationStatus, Restaurant, User,
};
pub use requests::{
    ConversationQuery, CreateReservationRequest, CreateRestaurantRequest, DiscoveryParams,
    LoginRequest, PushTokenRequest, RegisterRequest, SendMessageRequest, SendNotificationRequest,
};
pub use responses::{AuthResponse, Delivery, ErrorResponse, HealthResponse, SendNotificationResponse};

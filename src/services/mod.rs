// Service exports
pub mod auth;
pub mod notifier;
pub mod push;
pub mod store;

pub use auth::{AuthError, Claims, TokenService};
pub use notifier::Notifier;
pub use push::{DisabledPushSender, ExpoPushClient, PushError, PushMessage, PushSender, PushTicket};
pub use store::{AppwriteCollections, AppwriteStore, Collection, DocumentStore, MemoryStore, StoreError, StoreQuery};

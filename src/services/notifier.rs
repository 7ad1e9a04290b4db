use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

use crate::models::{Delivery, Notification, NotificationKind, User};
use crate::services::push::{PushMessage, PushSender, PushTicket};
use crate::services::store::{decode, encode, Collection, DocumentStore, StoreError};

/// Persists notifications and forwards them to the recipients' devices
///
/// Every notification is stored before anything is pushed, so a store failure
/// never leaves users with a push for a notification that does not exist. Push
/// delivery is best-effort: transport failures are logged and reported as error
/// tickets, the stored notifications are kept either way.
#[derive(Clone)]
pub struct Notifier {
    store: Arc<dyn DocumentStore>,
    push: Arc<dyn PushSender>,
}

impl Notifier {
    pub fn new(store: Arc<dyn DocumentStore>, push: Arc<dyn PushSender>) -> Self {
        Self { store, push }
    }

    pub async fn notify(
        &self,
        user_id: &str,
        kind: NotificationKind,
        title: &str,
        body: &str,
        data: Option<Value>,
    ) -> Result<Delivery, StoreError> {
        let mut deliveries = self
            .notify_many(std::slice::from_ref(&user_id.to_string()), kind, title, body, data)
            .await?;

        deliveries
            .pop()
            .ok_or_else(|| StoreError::InvalidDocument("no delivery produced".to_string()))
    }

    /// Notify several users with a single push request
    ///
    /// Deliveries come back in the order of `user_ids`.
    pub async fn notify_many(
        &self,
        user_ids: &[String],
        kind: NotificationKind,
        title: &str,
        body: &str,
        data: Option<Value>,
    ) -> Result<Vec<Delivery>, StoreError> {
        let mut push_tokens = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            let token = match self.store.find_by_id(Collection::Users, user_id).await? {
                Some(doc) => decode::<User>(doc)?.push_token,
                None => None,
            };
            push_tokens.push(token);
        }

        let now = Utc::now();
        let mut notifications = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            let notification = Notification {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: user_id.clone(),
                kind,
                title: title.to_string(),
                body: body.to_string(),
                data: data.clone(),
                read: false,
                created_at: now,
            };
            self.store
                .insert_one(Collection::Notifications, &notification.id, encode(&notification)?)
                .await?;
            notifications.push(notification);
        }

        // (delivery index, message) for every recipient with a device
        let (targets, messages): (Vec<usize>, Vec<PushMessage>) = push_tokens
            .into_iter()
            .enumerate()
            .filter_map(|(i, token)| {
                token.map(|token| (i, PushMessage::new(token, title, body).with_data(data.clone())))
            })
            .unzip();

        let mut tickets: Vec<Option<PushTicket>> = vec![None; notifications.len()];
        if !messages.is_empty() {
            for (index, ticket) in targets.into_iter().zip(self.dispatch(&messages).await) {
                if !ticket.is_ok() {
                    tracing::warn!(
                        "Push to user {} rejected: {}",
                        user_ids[index],
                        ticket.message.as_deref().unwrap_or("unknown error")
                    );
                }
                tickets[index] = Some(ticket);
            }
        }

        tracing::debug!(
            "Stored {} notifications, pushed {}",
            notifications.len(),
            messages.len()
        );

        Ok(notifications
            .into_iter()
            .zip(tickets)
            .map(|(notification, ticket)| Delivery { notification, ticket })
            .collect())
    }

    /// Send messages, always returning exactly one ticket per message
    async fn dispatch(&self, messages: &[PushMessage]) -> Vec<PushTicket> {
        match self.push.send(messages).await {
            Ok(mut tickets) => {
                if tickets.len() != messages.len() {
                    tracing::warn!(
                        "Push service returned {} tickets for {} messages",
                        tickets.len(),
                        messages.len()
                    );
                }
                tickets.resize_with(messages.len(), || {
                    PushTicket::failed("push service returned no ticket")
                });
                tickets
            }
            Err(e) => {
                tracing::warn!("Push delivery of {} messages failed: {}", messages.len(), e);
                messages
                    .iter()
                    .map(|_| PushTicket::failed(e.to_string()))
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::push::{PushError, PushStatus};
    use crate::services::store::{MemoryStore, StoreQuery};
    use async_trait::async_trait;
    use serde_json::json;

    struct AcceptAll;

    #[async_trait]
    impl PushSender for AcceptAll {
        async fn send(&self, messages: &[PushMessage]) -> Result<Vec<PushTicket>, PushError> {
            Ok(messages
                .iter()
                .map(|m| PushTicket {
                    status: PushStatus::Ok,
                    id: Some(format!("ticket-{}", m.to)),
                    message: None,
                })
                .collect())
        }
    }

    struct Unreachable;

    #[async_trait]
    impl PushSender for Unreachable {
        async fn send(&self, _messages: &[PushMessage]) -> Result<Vec<PushTicket>, PushError> {
            Err(PushError::ApiError("Push request failed: 503".to_string()))
        }
    }

    /// Accepts the first `accepted` messages of each call and records call sizes
    #[derive(Default)]
    struct Counting {
        calls: std::sync::Mutex<Vec<usize>>,
        accepted: Option<usize>,
    }

    #[async_trait]
    impl PushSender for Counting {
        async fn send(&self, messages: &[PushMessage]) -> Result<Vec<PushTicket>, PushError> {
            self.calls.lock().unwrap().push(messages.len());
            let accepted = self.accepted.unwrap_or(messages.len());
            Ok(messages
                .iter()
                .take(accepted)
                .map(|m| PushTicket {
                    status: PushStatus::Ok,
                    id: Some(format!("ticket-{}", m.to)),
                    message: None,
                })
                .collect())
        }
    }

    async fn add_user(store: &MemoryStore, id: &str, push_token: Option<&str>) {
        store
            .insert_one(
                Collection::Users,
                id,
                json!({
                    "id": id,
                    "name": format!("User {}", id),
                    "email": format!("{}@example.com", id),
                    "passwordHash": "x",
                    "pushToken": push_token,
                    "createdAt": Utc::now()
                }),
            )
            .await
            .unwrap();
    }

    async fn store_with_user(push_token: Option<&str>) -> MemoryStore {
        let store = MemoryStore::new();
        add_user(&store, "u1", push_token).await;
        store
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[tokio::test]
    async fn test_notify_many_sends_one_batch() {
        let store = MemoryStore::new();
        add_user(&store, "u1", Some("ExponentPushToken[u1]")).await;
        add_user(&store, "u2", None).await;
        add_user(&store, "u3", Some("ExponentPushToken[u3]")).await;

        let push = Arc::new(Counting::default());
        let notifier = Notifier::new(Arc::new(store.clone()), push.clone());

        let deliveries = notifier
            .notify_many(
                &ids(&["u1", "u2", "u3", "ghost"]),
                NotificationKind::System,
                "News",
                "Fresh openings",
                Some(json!({ "restaurantId": "A" })),
            )
            .await
            .unwrap();

        assert_eq!(*push.calls.lock().unwrap(), vec![2]);
        assert_eq!(store.len(Collection::Notifications), 4);

        let recipients: Vec<_> = deliveries.iter().map(|d| d.notification.user_id.as_str()).collect();
        assert_eq!(recipients, vec!["u1", "u2", "u3", "ghost"]);
        assert_eq!(
            deliveries[0].ticket.as_ref().unwrap().id.as_deref(),
            Some("ticket-ExponentPushToken[u1]")
        );
        assert!(deliveries[1].ticket.is_none());
        assert_eq!(
            deliveries[2].ticket.as_ref().unwrap().id.as_deref(),
            Some("ticket-ExponentPushToken[u3]")
        );
        assert!(deliveries[3].ticket.is_none());
    }

    /// Reads from the wrapped store, refuses every write
    struct ReadOnly(MemoryStore);

    #[async_trait]
    impl DocumentStore for ReadOnly {
        async fn find(&self, collection: Collection, query: &StoreQuery) -> Result<Vec<Value>, StoreError> {
            self.0.find(collection, query).await
        }

        async fn find_by_id(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
            self.0.find_by_id(collection, id).await
        }

        async fn insert_one(&self, _: Collection, _: &str, _: Value) -> Result<Value, StoreError> {
            Err(StoreError::Unavailable("read-only".to_string()))
        }

        async fn update_one(&self, _: Collection, _: &str, _: Value) -> Result<Option<Value>, StoreError> {
            Err(StoreError::Unavailable("read-only".to_string()))
        }

        async fn ping(&self) -> Result<bool, StoreError> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_store_failure_sends_no_push() {
        let store = store_with_user(Some("ExponentPushToken[u1]")).await;
        let push = Arc::new(Counting::default());
        let notifier = Notifier::new(Arc::new(ReadOnly(store)), push.clone());

        let result = notifier
            .notify_many(&ids(&["u1"]), NotificationKind::System, "Hi", "There", None)
            .await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert!(push.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_tickets_are_reported_as_failures() {
        let store = MemoryStore::new();
        add_user(&store, "u1", Some("ExponentPushToken[u1]")).await;
        add_user(&store, "u2", Some("ExponentPushToken[u2]")).await;

        let push = Arc::new(Counting {
            accepted: Some(1),
            ..Default::default()
        });
        let notifier = Notifier::new(Arc::new(store), push);

        let deliveries = notifier
            .notify_many(&ids(&["u1", "u2"]), NotificationKind::System, "Hi", "There", None)
            .await
            .unwrap();

        assert!(deliveries[0].ticket.as_ref().unwrap().is_ok());
        assert!(!deliveries[1].ticket.as_ref().unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_notify_pushes_to_registered_token() {
        let store = store_with_user(Some("ExponentPushToken[u1]")).await;
        let notifier = Notifier::new(Arc::new(store.clone()), Arc::new(AcceptAll));

        let delivery = notifier
            .notify("u1", NotificationKind::System, "Hello", "Welcome", None)
            .await
            .unwrap();

        let ticket = delivery.ticket.unwrap();
        assert!(ticket.is_ok());
        assert_eq!(ticket.id.as_deref(), Some("ticket-ExponentPushToken[u1]"));
        assert_eq!(store.len(Collection::Notifications), 1);
    }

    #[tokio::test]
    async fn test_notify_without_token_only_stores() {
        let store = store_with_user(None).await;
        let notifier = Notifier::new(Arc::new(store.clone()), Arc::new(AcceptAll));

        let delivery = notifier
            .notify("u1", NotificationKind::Message, "New message", "Hi", None)
            .await
            .unwrap();

        assert!(delivery.ticket.is_none());
        let stored = store
            .find(Collection::Notifications, &StoreQuery::new().equals("userId", "u1"))
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn test_push_failure_does_not_fail_notify() {
        let store = store_with_user(Some("ExponentPushToken[u1]")).await;
        let notifier = Notifier::new(Arc::new(store.clone()), Arc::new(Unreachable));

        let delivery = notifier
            .notify("u1", NotificationKind::Reservation, "Booked", "See you", None)
            .await
            .unwrap();

        assert!(!delivery.ticket.unwrap().is_ok());
        assert_eq!(store.len(Collection::Notifications), 1);
    }
}

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::error::ApiError;
use crate::models::{ChatMessage, ConversationQuery, NotificationKind, SendMessageRequest};
use crate::routes::{AppState, AuthUser};
use crate::services::store::{decode_all, encode, Collection, StoreQuery};

/// Longest message preview carried in a push notification
const PREVIEW_CHARS: usize = 120;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/messages", web::post().to(send_message))
        .route("/messages", web::get().to(conversation));
}

fn preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_CHARS {
        return content.to_string();
    }
    let truncated: String = content.chars().take(PREVIEW_CHARS).collect();
    format!("{}…", truncated)
}

/// Send a chat message to another user
///
/// POST /api/v1/messages
///
/// Request body:
/// ```json
/// {
///   "recipientId": "string",
///   "content": "string",
///   "reservationId": "string"
/// }
/// ```
async fn send_message(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let req = req.into_inner();

    if req.recipient_id == auth.user_id {
        return Err(ApiError::Validation("Cannot send a message to yourself".to_string()));
    }

    if state
        .store
        .find_by_id(Collection::Users, &req.recipient_id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found("User", &req.recipient_id));
    }

    let message = ChatMessage {
        id: uuid::Uuid::new_v4().to_string(),
        sender_id: auth.user_id.clone(),
        recipient_id: req.recipient_id,
        content: req.content,
        reservation_id: req.reservation_id,
        created_at: Utc::now(),
    };

    state
        .store
        .insert_one(Collection::ChatMessages, &message.id, encode(&message)?)
        .await?;

    tracing::debug!("Message {} from {} to {}", message.id, message.sender_id, message.recipient_id);

    if let Err(e) = state
        .notifier
        .notify(
            &message.recipient_id,
            NotificationKind::Message,
            "New message",
            &preview(&message.content),
            Some(json!({ "messageId": message.id, "senderId": message.sender_id })),
        )
        .await
    {
        tracing::warn!("Failed to notify {} about message {}: {}", message.recipient_id, message.id, e);
    }

    Ok(HttpResponse::Created().json(message))
}

/// Conversation between the caller and another user, oldest first
///
/// GET /api/v1/messages?with={userId}
async fn conversation(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<ConversationQuery>,
) -> Result<HttpResponse, ApiError> {
    let other = query.with.as_str();

    let sent = StoreQuery::new()
        .equals("senderId", auth.user_id.as_str())
        .equals("recipientId", other);
    let received = StoreQuery::new()
        .equals("senderId", other)
        .equals("recipientId", auth.user_id.as_str());

    let mut messages: Vec<ChatMessage> =
        decode_all(state.store.find(Collection::ChatMessages, &sent).await?)?;
    messages.extend(decode_all::<ChatMessage>(
        state.store.find(Collection::ChatMessages, &received).await?,
    )?);

    // Stable sort keeps storage order for identical timestamps
    messages.sort_by_key(|m| m.created_at);

    Ok(HttpResponse::Ok().json(messages))
}

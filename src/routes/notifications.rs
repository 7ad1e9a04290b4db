use actix_web::{web, HttpResponse};
use serde_json::json;
use validator::Validate;

use crate::error::ApiError;
use crate::models::{Notification, NotificationKind, SendNotificationRequest, SendNotificationResponse};
use crate::routes::{AppState, AuthUser};
use crate::services::store::{decode, decode_all, Collection, StoreQuery};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/notifications", web::get().to(list_notifications))
        .route("/notifications/send", web::post().to(send_notifications))
        .route("/notifications/{id}/read", web::post().to(mark_read));
}

/// GET /api/v1/notifications
async fn list_notifications(
    state: web::Data<AppState>,
    auth: AuthUser,
) -> Result<HttpResponse, ApiError> {
    let query = StoreQuery::new().equals("userId", auth.user_id.as_str());
    let notifications: Vec<Notification> =
        decode_all(state.store.find(Collection::Notifications, &query).await?)?;

    Ok(HttpResponse::Ok().json(notifications))
}

/// POST /api/v1/notifications/{id}/read
async fn mark_read(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let owned = state
        .store
        .find_by_id(Collection::Notifications, &id)
        .await?
        .map(decode::<Notification>)
        .transpose()?
        .is_some_and(|n| n.user_id == auth.user_id);
    if !owned {
        return Err(ApiError::not_found("Notification", &id));
    }

    let updated = state
        .store
        .update_one(Collection::Notifications, &id, json!({ "read": true }))
        .await?
        .ok_or_else(|| ApiError::not_found("Notification", &id))?;

    let notification: Notification = decode(updated)?;
    Ok(HttpResponse::Ok().json(notification))
}

/// Notify a set of users with one push request, reporting the outcome per recipient
///
/// POST /api/v1/notifications/send
///
/// Request body:
/// ```json
/// {
///   "userIds": ["string"],
///   "title": "string",
///   "body": "string",
///   "data": {}
/// }
/// ```
async fn send_notifications(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<SendNotificationRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let deliveries = state
        .notifier
        .notify_many(
            &req.user_ids,
            NotificationKind::System,
            &req.title,
            &req.body,
            req.data.clone(),
        )
        .await?;

    let delivered = deliveries
        .iter()
        .filter(|d| d.ticket.as_ref().is_some_and(|t| t.is_ok()))
        .count();
    let failed = deliveries
        .iter()
        .filter(|d| d.ticket.as_ref().is_some_and(|t| !t.is_ok()))
        .count();

    tracing::info!(
        "User {} sent notification to {} users ({} pushed, {} failed)",
        auth.user_id,
        deliveries.len(),
        delivered,
        failed
    );

    Ok(HttpResponse::Ok().json(SendNotificationResponse {
        deliveries,
        delivered,
        failed,
    }))
}

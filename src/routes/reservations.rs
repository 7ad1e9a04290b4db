use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::error::ApiError;
use crate::models::{CreateReservationRequest, NotificationKind, Reservation, ReservationStatus, Restaurant};
use crate::routes::{AppState, AuthUser};
use crate::services::store::{decode, decode_all, encode, Collection, StoreQuery};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/reservations", web::post().to(create_reservation))
        .route("/reservations", web::get().to(list_reservations))
        .route("/reservations/{id}", web::get().to(get_reservation))
        .route("/reservations/{id}/cancel", web::post().to(cancel_reservation));
}

/// Load a reservation owned by the caller; other users' reservations read as missing
async fn owned_reservation(state: &AppState, auth: &AuthUser, id: &str) -> Result<Reservation, ApiError> {
    let reservation: Reservation = state
        .store
        .find_by_id(Collection::Reservations, id)
        .await?
        .map(decode)
        .transpose()?
        .filter(|r: &Reservation| r.user_id == auth.user_id)
        .ok_or_else(|| ApiError::not_found("Reservation", id))?;

    Ok(reservation)
}

/// Create a reservation
///
/// POST /api/v1/reservations
///
/// Request body:
/// ```json
/// {
///   "restaurantId": "string",
///   "reservedFor": "2026-10-16T19:30:00Z",
///   "partySize": 2,
///   "notes": "string"
/// }
/// ```
async fn create_reservation(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<CreateReservationRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let req = req.into_inner();

    let restaurant: Restaurant = state
        .store
        .find_by_id(Collection::Restaurants, &req.restaurant_id)
        .await?
        .map(decode)
        .transpose()?
        .ok_or_else(|| ApiError::not_found("Restaurant", &req.restaurant_id))?;

    let reservation = Reservation {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: auth.user_id.clone(),
        restaurant_id: restaurant.id.clone(),
        reserved_for: req.reserved_for,
        party_size: req.party_size,
        notes: req.notes,
        status: ReservationStatus::Pending,
        created_at: Utc::now(),
    };

    state
        .store
        .insert_one(Collection::Reservations, &reservation.id, encode(&reservation)?)
        .await?;

    tracing::info!(
        "User {} reserved {} for {} at {}",
        auth.user_id,
        restaurant.id,
        reservation.party_size,
        reservation.reserved_for
    );

    let body = format!(
        "Table for {} at {} on {}",
        reservation.party_size,
        restaurant.name,
        reservation.reserved_for.format("%Y-%m-%d %H:%M UTC")
    );
    if let Err(e) = state
        .notifier
        .notify(
            &auth.user_id,
            NotificationKind::Reservation,
            "Reservation received",
            &body,
            Some(json!({ "reservationId": reservation.id })),
        )
        .await
    {
        tracing::warn!("Failed to notify user {} about reservation: {}", auth.user_id, e);
    }

    Ok(HttpResponse::Created().json(reservation))
}

/// GET /api/v1/reservations
async fn list_reservations(
    state: web::Data<AppState>,
    auth: AuthUser,
) -> Result<HttpResponse, ApiError> {
    let query = StoreQuery::new().equals("userId", auth.user_id.as_str());
    let reservations: Vec<Reservation> =
        decode_all(state.store.find(Collection::Reservations, &query).await?)?;

    tracing::debug!("User {} has {} reservations", auth.user_id, reservations.len());

    Ok(HttpResponse::Ok().json(reservations))
}

/// GET /api/v1/reservations/{id}
async fn get_reservation(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let reservation = owned_reservation(&state, &auth, &path).await?;
    Ok(HttpResponse::Ok().json(reservation))
}

/// POST /api/v1/reservations/{id}/cancel
async fn cancel_reservation(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let reservation = owned_reservation(&state, &auth, &path).await?;

    if reservation.status == ReservationStatus::Cancelled {
        return Ok(HttpResponse::Ok().json(reservation));
    }

    let updated = state
        .store
        .update_one(
            Collection::Reservations,
            &reservation.id,
            json!({ "status": ReservationStatus::Cancelled }),
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Reservation", &reservation.id))?;

    tracing::info!("User {} cancelled reservation {}", auth.user_id, reservation.id);

    let reservation: Reservation = decode(updated)?;
    Ok(HttpResponse::Ok().json(reservation))
}

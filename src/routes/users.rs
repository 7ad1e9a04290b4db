use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::error::ApiError;
use crate::models::{AuthResponse, LoginRequest, PublicUser, PushTokenRequest, RegisterRequest, User};
use crate::routes::{AppState, AuthUser};
use crate::services::auth::{hash_password, verify_password};
use crate::services::store::{decode, decode_all, encode, Collection, StoreQuery};
use crate::services::AuthError;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/users/register", web::post().to(register))
        .route("/users/login", web::post().to(login))
        .route("/users/me", web::get().to(current_user))
        .route("/users/me/push-token", web::put().to(set_push_token));
}

async fn find_by_email(state: &AppState, email: &str) -> Result<Option<User>, ApiError> {
    let query = StoreQuery::new().equals("email", email);
    let users: Vec<User> = decode_all(state.store.find(Collection::Users, &query).await?)?;
    Ok(users.into_iter().next())
}

async fn load_user(state: &AppState, user_id: &str) -> Result<User, ApiError> {
    let doc = state
        .store
        .find_by_id(Collection::Users, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", user_id))?;
    Ok(decode(doc)?)
}

/// Register a new user
///
/// Registrations are serialized within this process so two requests for the same
/// email cannot both pass the uniqueness check. Several instances sharing one
/// Appwrite database additionally need a unique index on `email`.
///
/// POST /api/v1/users/register
async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let req = req.into_inner();
    let email = req.email.trim().to_lowercase();

    let _registration = state.registrations.lock().await;

    if find_by_email(&state, &email).await?.is_some() {
        tracing::info!("Registration rejected, email already in use");
        return Err(ApiError::Validation("Email is already registered".to_string()));
    }

    let password = req.password;
    let password_hash = web::block(move || hash_password(&password)).await??;

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        name: req.name,
        email,
        password_hash,
        bio: req.bio,
        push_token: None,
        created_at: Utc::now(),
    };

    state
        .store
        .insert_one(Collection::Users, &user.id, encode(&user)?)
        .await?;

    let token = state.tokens.issue(&user.id, &user.email)?;

    tracing::info!("Registered user {}", user.id);

    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        user: PublicUser::from(user),
    }))
}

/// Exchange email and password for an access token
///
/// POST /api/v1/users/login
async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let req = req.into_inner();
    let email = req.email.trim().to_lowercase();

    let user = find_by_email(&state, &email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let password = req.password;
    let hash = user.password_hash.clone();
    let valid = web::block(move || verify_password(&password, &hash)).await?;
    if !valid {
        tracing::info!("Failed login for user {}", user.id);
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.tokens.issue(&user.id, &user.email)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: PublicUser::from(user),
    }))
}

/// GET /api/v1/users/me
async fn current_user(
    state: web::Data<AppState>,
    auth: AuthUser,
) -> Result<HttpResponse, ApiError> {
    let user = load_user(&state, &auth.user_id).await?;
    Ok(HttpResponse::Ok().json(PublicUser::from(user)))
}

/// Register the device token used for push notifications
///
/// PUT /api/v1/users/me/push-token
async fn set_push_token(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<PushTokenRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let updated = state
        .store
        .update_one(
            Collection::Users,
            &auth.user_id,
            json!({ "pushToken": req.push_token }),
        )
        .await?
        .ok_or_else(|| ApiError::not_found("User", &auth.user_id))?;

    tracing::debug!("Updated push token for user {}", auth.user_id);

    let user: User = decode(updated)?;
    Ok(HttpResponse::Ok().json(PublicUser::from(user)))
}

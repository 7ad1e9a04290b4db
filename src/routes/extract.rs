use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::error::ApiError;
use crate::routes::AppState;
use crate::services::AuthError;

/// Authenticated caller, resolved from an `Authorization: Bearer <jwt>` header
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
}

impl AuthUser {
    fn from_http_request(req: &HttpRequest) -> Result<Self, ApiError> {
        let state = req
            .app_data::<web::Data<AppState>>()
            .ok_or_else(|| ApiError::Internal("application state not configured".to_string()))?;

        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = state.tokens.verify(token)?;

        Ok(Self {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = Self::from_http_request(req);
        if let Err(e) = &result {
            tracing::info!("Rejected request to {}: {}", req.path(), e);
        }
        ready(result)
    }
}

//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use lifelink_core::auth::AuthError;
use lifelink_core::store::StoreError;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type ApiResult<T> = Result<T, ApiError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// No credential, or a malformed bearer header.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Credential present but rejected: invalid or expired session, or a
    /// role the route does not allow. The response body never says which.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, "bad_request", m.as_str()),
            ApiError::Unauthenticated(m) => (StatusCode::UNAUTHORIZED, "unauthenticated", m.as_str()),
            // One generic message for every 403: the caller must not learn
            // whether the role was wrong or the resource was off-limits.
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden", "Access denied"),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.as_str()),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, "conflict", m.as_str()),
            ApiError::Internal(detail) => {
                error!(detail = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };
        let body = Json(ErrorResponse {
            error: code.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidAssertion(m) => ApiError::Unauthenticated(m),
            AuthError::InvalidSession(m) => ApiError::Forbidden(m),
            AuthError::TokenError(m) => ApiError::Internal(m),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(collection) => {
                ApiError::Conflict(format!("duplicate document in '{collection}'"))
            }
            StoreError::InvalidDocument(m) => ApiError::BadRequest(m),
            // Connection faults surface as a plain 500; the cache retries
            // on the next request.
            other => ApiError::Internal(other.to_string()),
        }
    }
}

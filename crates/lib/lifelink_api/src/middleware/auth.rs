//! Access gate — the per-route authentication and authorization stages.
//!
//! Each route group declares its stages statically at registration time in
//! [`crate::router`]: `require_session` first, then `require_roles` for
//! role-restricted groups. Layer nesting fixes the order, so a request is
//! always authenticated before it is authorized, and the first failing
//! stage short-circuits with its own error.

use axum::http::{HeaderMap, header::AUTHORIZATION};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use lifelink_core::auth::session::verify_session_token;
use lifelink_core::models::user::Role;

use crate::AppState;
use crate::error::ApiError;

/// Allowed-role set for admin-only route groups.
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Allowed-role set for donor-only route groups.
pub const DONOR_ONLY: &[Role] = &[Role::Donor];

/// Identity of the verified caller, derived from the session token.
///
/// Populated once by `require_session` and read-only from then on; handlers
/// receive it through request extensions.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub email: String,
    pub subject_id: String,
    pub role: Role,
}

/// Extract the token from a `Authorization: Bearer <token>` header.
///
/// Rejects before any decoding happens: a missing header or a non-bearer
/// scheme is `Unauthenticated`, not an invalid credential.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthenticated("Missing authorization header".into()))?;
    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthenticated("Invalid authorization scheme".into()))
}

/// Authentication stage: verifies the session token and injects
/// [`RequestContext`] into request extensions.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;
    let claims = verify_session_token(token, state.config.session_secret.as_bytes())?;

    let context = RequestContext {
        email: claims.email,
        subject_id: claims.sub,
        role: claims.role,
    };
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

/// Authorization stage: checks the caller's role against the route group's
/// allowed set. Runs strictly after `require_session`.
pub async fn require_roles(
    allowed: &'static [Role],
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let context = request
        .extensions()
        .get::<RequestContext>()
        .ok_or_else(|| ApiError::Unauthenticated("Missing session".into()))?;

    if !allowed.contains(&context.role) {
        return Err(ApiError::Forbidden(format!(
            "role '{}' not in allowed set",
            context.role
        )));
    }

    Ok(next.run(request).await)
}

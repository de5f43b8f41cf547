//! Credential exchange: external identity assertion → session token.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;

use crate::AppState;
use crate::error::ApiResult;
use crate::middleware::auth::bearer_token;
use crate::models::SessionResponse;
use crate::services::session;

/// `POST /session` — exchange a bearer identity assertion for a session
/// token. The assertion is consumed once and never persisted.
pub async fn create_session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<SessionResponse>> {
    let assertion_token = bearer_token(&headers)?;
    let assertion = state.verifier.verify(assertion_token)?;

    let store = state.store.acquire().await?;
    let token = session::issue(
        store.as_ref(),
        &assertion,
        state.config.session_secret.as_bytes(),
    )
    .await?;

    Ok(Json(SessionResponse { token }))
}

//! Session issuer — exchanges a verified identity assertion for a session
//! token stamped with the caller's stored role.

use serde_json::json;
use tracing::info;

use lifelink_core::auth::session::issue_session_token;
use lifelink_core::models::auth::AssertionClaims;
use lifelink_core::models::user::Role;
use lifelink_core::store::ResourceStore;

use crate::error::ApiResult;

/// Issue a session token for a verified assertion.
///
/// The role comes from the stored user record at issuance time. A missing
/// record is not an error — registration may happen after the first sign-in
/// — the role then defaults to `donor` until the next exchange.
pub async fn issue(
    store: &dyn ResourceStore,
    assertion: &AssertionClaims,
    secret: &[u8],
) -> ApiResult<String> {
    let user = store
        .find_one("users", &json!({"email": assertion.email}))
        .await?;

    let role = user
        .as_ref()
        .and_then(|doc| doc.get("role"))
        .and_then(|value| serde_json::from_value::<Role>(value.clone()).ok())
        .unwrap_or(Role::Donor);

    info!(email = %assertion.email, role = %role, "issuing session token");

    let token = issue_session_token(&assertion.sub, &assertion.email, role, secret)?;
    Ok(token)
}

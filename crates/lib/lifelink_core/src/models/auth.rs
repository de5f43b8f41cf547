//! Authentication domain models.

use serde::{Deserialize, Serialize};

use super::user::Role;

/// Claims carried by a verified external identity assertion.
///
/// Produced once per credential exchange by the identity verifier and
/// consumed by the session issuer; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Subject — the identity provider's stable user id.
    pub sub: String,
    /// Email asserted by the identity provider.
    pub email: String,
    /// Expiry (unix timestamp), validated upstream.
    pub exp: i64,
}

/// Claims embedded in a Lifelink session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject — the identity provider's user id, carried through unchanged.
    pub sub: String,
    /// User email.
    pub email: String,
    /// Role at issuance time.
    pub role: Role,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
}

//! Credential verification primitives.
//!
//! Two stateless verifiers live here: one for external identity assertions
//! (the federated sign-in token presented to `POST /session`) and one for
//! Lifelink's own session tokens. Both are pure functions of token plus
//! key material; the HTTP layer decides how failures map to status codes.

pub mod assertion;
pub mod session;

use thiserror::Error;

/// Credential verification errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The external identity assertion failed verification: malformed,
    /// wrong issuer, expired upstream, or signature mismatch.
    #[error("invalid identity assertion: {0}")]
    InvalidAssertion(String),

    /// The session token failed verification: malformed, signature
    /// mismatch, or expired.
    #[error("invalid session token: {0}")]
    InvalidSession(String),

    /// Token construction failed (signing side).
    #[error("token error: {0}")]
    TokenError(String),
}

//! Session token signing and verification.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::info;

use super::AuthError;
use crate::models::auth::SessionClaims;
use crate::models::user::Role;

/// Session token lifetime: 7 days. Expiry is the only invalidation
/// mechanism; there is no server-side revocation.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Sign a session token (HS256, 7 day expiry) for a verified identity.
pub fn issue_session_token(
    subject_id: &str,
    email: &str,
    role: Role,
    secret: &[u8],
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = SessionClaims {
        sub: subject_id.to_string(),
        email: email.to_string(),
        role,
        exp: (now + Duration::days(SESSION_TTL_DAYS)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
}

/// Verify a session token, returning the claims on success.
pub fn verify_session_token(token: &str, secret: &[u8]) -> Result<SessionClaims, AuthError> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::default();
    validation.validate_exp = true;
    decode::<SessionClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| AuthError::InvalidSession(e.to_string()))
}

/// Resolve the session signing secret: env var `SESSION_SECRET` → persisted file.
pub fn resolve_session_secret() -> String {
    if let Ok(secret) = std::env::var("SESSION_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    // Generate and persist
    let secret_path = session_secret_path();
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&secret_path, &secret);
    info!(path = %secret_path.display(), "generated new session secret");
    secret
}

/// Path to the persisted session secret file.
fn session_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lifelink")
        .join("session-secret")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-session-secret";

    #[test]
    fn roundtrip_preserves_claims() {
        let token = issue_session_token("uid-1", "a@x.com", Role::Volunteer, SECRET).unwrap();
        let claims = verify_session_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "uid-1");
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.role, Role::Volunteer);
        assert_eq!(claims.exp - claims.iat, SESSION_TTL_DAYS * 24 * 60 * 60);
    }

    #[test]
    fn token_has_three_segments() {
        let token = issue_session_token("uid-1", "a@x.com", Role::Donor, SECRET).unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_session_token("uid-1", "a@x.com", Role::Donor, SECRET).unwrap();
        let err = verify_session_token(&token, b"other-secret").unwrap_err();
        assert!(matches!(err, AuthError::InvalidSession(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        // Sign claims that expired 8 days ago, well past the verifier leeway.
        let now = Utc::now();
        let claims = SessionClaims {
            sub: "uid-1".into(),
            email: "a@x.com".into(),
            role: Role::Donor,
            exp: (now - Duration::days(8)).timestamp(),
            iat: (now - Duration::days(15)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        let err = verify_session_token(&token, SECRET).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSession(_)));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = issue_session_token("uid-1", "a@x.com", Role::Donor, SECRET).unwrap();
        let mut tampered = token.clone();
        tampered.truncate(token.len() - 2);
        assert!(verify_session_token(&tampered, SECRET).is_err());
    }
}

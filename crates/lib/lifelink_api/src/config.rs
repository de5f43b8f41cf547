//! API server configuration.

use lifelink_core::auth::AuthError;
use lifelink_core::auth::assertion::IdentityVerifier;
use lifelink_core::auth::session::resolve_session_secret;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:4000").
    pub bind_addr: String,
    /// Resource store connection URL. Empty means unconfigured; the first
    /// store access then fails with a connection error, but the server
    /// still starts and serves.
    pub database_url: String,
    /// Session token signing secret.
    pub session_secret: String,
    /// Expected issuer of external identity assertions.
    pub identity_issuer: String,
    /// RS256 public key of the identity provider (PEM). Preferred.
    pub identity_public_key_pem: Option<String>,
    /// HS256 shared secret of the identity provider. Dev/test fallback.
    pub identity_shared_secret: Option<String>,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                  | Default                        |
    /// |---------------------------|--------------------------------|
    /// | `BIND_ADDR`               | `127.0.0.1:4000`               |
    /// | `DATABASE_URL`            | *(unset — store unconfigured)* |
    /// | `SESSION_SECRET`          | generated & persisted to file  |
    /// | `IDENTITY_ISSUER`         | `lifelink-identity`            |
    /// | `IDENTITY_PUBLIC_KEY_PEM` | —                              |
    /// | `IDENTITY_SHARED_SECRET`  | —                              |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:4000".into()),
            database_url: std::env::var("DATABASE_URL").unwrap_or_default(),
            session_secret: resolve_session_secret(),
            identity_issuer: std::env::var("IDENTITY_ISSUER")
                .unwrap_or_else(|_| "lifelink-identity".into()),
            identity_public_key_pem: std::env::var("IDENTITY_PUBLIC_KEY_PEM").ok(),
            identity_shared_secret: std::env::var("IDENTITY_SHARED_SECRET").ok(),
        }
    }

    /// Build the assertion verifier from the configured key material.
    ///
    /// Fails when neither a public key nor a shared secret is configured —
    /// without key material no assertion could ever verify, so the server
    /// refuses to start rather than reject every exchange at runtime.
    pub fn identity_verifier(&self) -> Result<IdentityVerifier, AuthError> {
        if let Some(pem) = &self.identity_public_key_pem {
            return IdentityVerifier::from_rsa_pem(pem.as_bytes(), &self.identity_issuer);
        }
        if let Some(secret) = &self.identity_shared_secret {
            return Ok(IdentityVerifier::from_secret(
                secret.as_bytes(),
                &self.identity_issuer,
            ));
        }
        Err(AuthError::TokenError(
            "no identity provider key material configured".into(),
        ))
    }
}

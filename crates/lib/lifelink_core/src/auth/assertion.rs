//! External identity assertion verification.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use super::AuthError;
use crate::models::auth::AssertionClaims;

/// Verifies identity assertions issued by the external identity provider.
///
/// Stateless: holds only the provider's verification key and the expected
/// issuer. Production deployments verify RS256 against the provider's
/// published public key; the shared-secret mode exists for development and
/// tests, where standing up a real provider is not practical.
pub struct IdentityVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl IdentityVerifier {
    /// Verifier for RS256 assertions, from the provider's public key PEM.
    pub fn from_rsa_pem(pem: &[u8], issuer: &str) -> Result<Self, AuthError> {
        let key = DecodingKey::from_rsa_pem(pem)
            .map_err(|e| AuthError::TokenError(format!("identity key: {e}")))?;
        Ok(Self {
            key,
            validation: Self::validation(Algorithm::RS256, issuer),
        })
    }

    /// Verifier for HS256 assertions signed with a shared secret.
    pub fn from_secret(secret: &[u8], issuer: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
            validation: Self::validation(Algorithm::HS256, issuer),
        }
    }

    fn validation(alg: Algorithm, issuer: &str) -> Validation {
        let mut validation = Validation::new(alg);
        validation.set_issuer(&[issuer]);
        validation
    }

    /// Verify an assertion, returning the provider-asserted identity.
    pub fn verify(&self, token: &str) -> Result<AssertionClaims, AuthError> {
        decode::<AssertionClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidAssertion(e.to_string()))
    }
}

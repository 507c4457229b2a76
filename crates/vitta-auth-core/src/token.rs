//! Access token issuance and validation
//!
//! Stateless HS256-signed claims. Issuance and validation are pure over
//! (secret, token, now) and safe for unbounded concurrent callers.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use vitta_types::{AccessClaims, UserId};

use crate::{AuthConfig, AuthError};

/// Pre-built signing and verification keys for access tokens
#[derive(Clone)]
pub struct AccessTokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
}

impl AccessTokenKeys {
    /// Build keys from the configured secret.
    ///
    /// The secret length is validated when the [`AuthConfig`] is
    /// constructed.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.token_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.token_secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        }
    }

    /// Issue a signed access token for a user
    pub fn issue(&self, user_id: UserId, email: &str, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now,
            exp: now + ttl.as_secs() as i64,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            tracing::error!("failed to sign access token: {}", e);
            AuthError::Internal("failed to sign access token".to_string())
        })
    }

    /// Validate a presented access token and return its claims.
    ///
    /// Bad signature, wrong issuer or audience, missing claims, and expiry
    /// all collapse to the same error; the caller learns nothing about
    /// which check failed.
    pub fn validate(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let data = decode::<AccessClaims>(token, &self.decoding, &validation).map_err(|e| {
            tracing::debug!("access token validation failed: {}", e);
            AuthError::InvalidCredentials
        })?;

        Ok(data.claims)
    }
}

impl std::fmt::Debug for AccessTokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenKeys")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

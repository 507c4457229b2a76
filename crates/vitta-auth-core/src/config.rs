//! Configuration types for the auth core

use std::time::Duration;

/// Default issuer/audience claim for access tokens
pub const DEFAULT_TOKEN_ISSUER: &str = "vitta";

/// Issuer values Google uses for ID tokens
pub const GOOGLE_ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];

/// Google's published JWKS endpoint
pub const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";

/// Auth core configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret for access-token signing (must be at least 32 bytes)
    pub token_secret: String,
    /// `iss` claim stamped into and required of access tokens
    pub issuer: String,
    /// `aud` claim stamped into and required of access tokens
    pub audience: String,
    /// Access token lifetime
    pub access_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_ttl: Duration,
    /// Google OAuth client ID (expected `aud` of Google ID tokens)
    pub google_client_id: String,
    /// JWKS endpoint for verifying Google ID tokens
    pub google_jwks_url: String,
    /// How long fetched JWKS keys are cached
    pub jwks_cache_duration: Duration,
    /// Allowed clock skew when checking Google token time bounds
    pub clock_skew: Duration,
}

impl AuthConfig {
    /// Create a config with default lifetimes.
    ///
    /// # Errors
    /// Returns an error if the token secret is shorter than 32 bytes.
    pub fn try_new(
        token_secret: impl Into<String>,
        google_client_id: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let token_secret = token_secret.into();
        if token_secret.len() < 32 {
            return Err(ConfigError::SecretTooShort {
                actual: token_secret.len(),
                minimum: 32,
            });
        }

        Ok(Self {
            token_secret,
            issuer: DEFAULT_TOKEN_ISSUER.to_string(),
            audience: DEFAULT_TOKEN_ISSUER.to_string(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            google_client_id: google_client_id.into(),
            google_jwks_url: GOOGLE_JWKS_URL.to_string(),
            jwks_cache_duration: Duration::from_secs(60 * 60),
            clock_skew: Duration::from_secs(10),
        })
    }

    /// Set the access token lifetime
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Set the refresh token lifetime
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    /// Override the JWKS endpoint (used by tests against a mock server)
    pub fn with_jwks_url_override(mut self, url: impl Into<String>) -> Self {
        self.google_jwks_url = url.into();
        self
    }

    /// Set the JWKS cache duration
    pub fn with_jwks_cache_duration(mut self, duration: Duration) -> Self {
        self.jwks_cache_duration = duration;
        self
    }

    /// Set the allowed clock skew for federated token validation
    pub fn with_clock_skew(mut self, skew: Duration) -> Self {
        self.clock_skew = skew;
        self
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"[redacted]")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("google_client_id", &self.google_client_id)
            .field("google_jwks_url", &self.google_jwks_url)
            .field("jwks_cache_duration", &self.jwks_cache_duration)
            .field("clock_skew", &self.clock_skew)
            .finish()
    }
}

/// Configuration error
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("token secret too short: got {actual} bytes, need at least {minimum}")]
    SecretTooShort { actual: usize, minimum: usize },
}

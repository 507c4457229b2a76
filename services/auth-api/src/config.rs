//! Configuration for the Auth API service.

use std::time::Duration;

use vitta_auth_core::AuthConfig;

/// Auth API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Database URL
    pub database_url: String,

    /// Auth core configuration
    pub auth: AuthConfig,

    /// How often the expired-token sweep runs
    pub sweep_interval: Duration,

    /// Google sign-in rate limit: requests per minute per IP
    pub google_rate_limit_per_minute: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Database
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        // Server port
        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        // Token secret (minimum 32 bytes, enforced by AuthConfig)
        let token_secret =
            std::env::var("TOKEN_SECRET").map_err(|_| ConfigError::Missing("TOKEN_SECRET"))?;

        // Google OAuth client ID
        let google_client_id = std::env::var("GOOGLE_CLIENT_ID")
            .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?;

        // Access token lifetime (default 15 minutes)
        let access_ttl_minutes: u64 = std::env::var("ACCESS_TTL_MINUTES")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("ACCESS_TTL_MINUTES"))?;

        // Refresh token lifetime (default 30 days)
        let refresh_ttl_days: u64 = std::env::var("REFRESH_TTL_DAYS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REFRESH_TTL_DAYS"))?;

        // Expired-token sweep interval (default 1 hour)
        let sweep_interval_secs: u64 = std::env::var("SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("SWEEP_INTERVAL_SECS"))?;

        // Google sign-in rate limit (default 10 per minute per IP)
        let google_rate_limit_per_minute: u32 = std::env::var("GOOGLE_RATE_LIMIT_PER_MINUTE")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("GOOGLE_RATE_LIMIT_PER_MINUTE"))?;

        let auth = AuthConfig::try_new(token_secret, google_client_id)
            .map_err(|e| ConfigError::AuthConfig(e.to_string()))?
            .with_access_ttl(Duration::from_secs(access_ttl_minutes * 60))
            .with_refresh_ttl(Duration::from_secs(refresh_ttl_days * 24 * 3600));

        Ok(Self {
            http_port,
            database_url,
            auth,
            sweep_interval: Duration::from_secs(sweep_interval_secs),
            google_rate_limit_per_minute,
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Auth config error: {0}")]
    AuthConfig(String),
}

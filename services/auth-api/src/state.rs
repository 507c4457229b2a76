//! Application state

use std::ops::Deref;
use std::sync::Arc;

use vitta_auth_core::AuthService;
use vitta_db::{DbPool, RefreshTokenRepository, UserRepository};

use crate::config::Config;
use crate::rate_limit::IpRateLimiter;

/// Auth service over trait-object repositories, so the binary can wire
/// Postgres while tests inject in-memory doubles
pub type AuthServiceImpl = AuthService<dyn UserRepository, dyn RefreshTokenRepository>;

/// Shared database pool wrapper for health checks
#[derive(Clone)]
pub struct SharedPool(Arc<DbPool>);

impl Deref for SharedPool {
    type Target = DbPool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Auth service for credentials and the token lifecycle
    pub auth: Arc<AuthServiceImpl>,
    /// Database connection pool (shared reference for health checks)
    pub pool: SharedPool,
    /// Per-IP limiter guarding the Google sign-in endpoint
    pub google_limiter: Arc<IpRateLimiter>,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(auth: AuthServiceImpl, pool: DbPool, config: Config) -> Self {
        Self {
            auth: Arc::new(auth),
            pool: SharedPool(Arc::new(pool)),
            google_limiter: Arc::new(IpRateLimiter::per_minute(
                config.google_rate_limit_per_minute,
            )),
            config: Arc::new(config),
        }
    }
}

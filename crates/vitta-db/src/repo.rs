//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DbResult;
use crate::models::{RefreshTokenRow, UserRow};

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: i64) -> DbResult<Option<UserRow>>;

    /// Find a user by normalized email
    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>>;

    /// Find a user by federated subject ID
    async fn find_by_google_id(&self, google_id: &str) -> DbResult<Option<UserRow>>;

    /// Create a new user
    async fn create(&self, user: CreateUser) -> DbResult<UserRow>;

    /// Attach a federated subject ID to an existing account
    async fn link_google_id(&self, id: i64, google_id: &str) -> DbResult<()>;

    /// Update profile attributes; `None` fields are left untouched
    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> DbResult<UserRow>;

    /// Replace the password hash (password reset / set-password flow)
    async fn set_password_hash(&self, id: i64, password_hash: &str) -> DbResult<()>;

    /// Flip the account-active flag
    async fn set_active(&self, id: i64, active: bool) -> DbResult<()>;

    /// Record a successful login
    async fn touch_last_login(&self, id: i64) -> DbResult<()>;
}

/// Create user input
#[derive(Debug, Clone, Default)]
pub struct CreateUser {
    /// Normalized email
    pub email: String,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub full_name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture_url: Option<String>,
    pub email_verified: bool,
}

/// Profile update input; only `Some` fields are written
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture_url: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.given_name.is_none()
            && self.family_name.is_none()
            && self.picture_url.is_none()
    }
}

/// Refresh token repository trait
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Persist a new token row
    async fn create(&self, token: CreateRefreshToken) -> DbResult<RefreshTokenRow>;

    /// Find a row by digest that is active AND unexpired.
    ///
    /// Inactive, expired, and nonexistent digests are all indistinguishable
    /// to the caller: `None`.
    async fn find_usable_by_digest(&self, digest: &str) -> DbResult<Option<RefreshTokenRow>>;

    /// Atomically flip the row matching `digest` from active to inactive,
    /// conditioned on it still being active and unexpired. Returns the row
    /// if the conditional update matched, `None` if it affected zero rows.
    ///
    /// This single conditional write is the double-spend guard: of two
    /// racing calls for the same digest, exactly one observes the match.
    async fn revoke_usable(&self, digest: &str, ip: Option<&str>)
        -> DbResult<Option<RefreshTokenRow>>;

    /// Revoke every active token for a user; returns the number revoked
    async fn revoke_all_for_user(&self, user_id: i64) -> DbResult<u64>;

    /// All token rows for a user, newest first (audit/listing)
    async fn find_by_user_id(&self, user_id: i64) -> DbResult<Vec<RefreshTokenRow>>;

    /// Flip expired-but-still-active rows to inactive. Hygiene only;
    /// correctness never depends on this sweep having run.
    async fn sweep_expired(&self) -> DbResult<u64>;
}

/// Create refresh token input
#[derive(Debug, Clone)]
pub struct CreateRefreshToken {
    pub token_digest: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub user_agent: Option<String>,
}

//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// User row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    /// Argon2 digest; NULL for accounts created purely via federated login
    pub password_hash: Option<String>,
    /// Federated subject ID (Google `sub`), unique when present
    pub google_id: Option<String>,
    pub full_name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture_url: Option<String>,
    pub email_verified: bool,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Convert to domain UserId
    pub fn user_id(&self) -> vitta_types::UserId {
        vitta_types::UserId(self.id)
    }

    /// Whether the account has at least one usable authentication method
    pub fn has_auth_method(&self) -> bool {
        self.password_hash.is_some() || self.google_id.is_some()
    }
}

/// Refresh token row from the database.
///
/// Only the SHA-256 digest of the opaque secret is ever stored.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshTokenRow {
    pub id: i64,
    pub token_digest: String,
    pub user_id: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoked_by_ip: Option<String>,
    pub user_agent: Option<String>,
}

impl RefreshTokenRow {
    /// Convert to domain UserId
    pub fn user_id(&self) -> vitta_types::UserId {
        vitta_types::UserId(self.user_id)
    }

    /// Check if the row is past its expiry
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Check if the row is usable (active and unexpired)
    pub fn is_usable(&self) -> bool {
        self.is_active && !self.is_expired()
    }
}

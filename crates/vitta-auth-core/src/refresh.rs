//! Refresh token lifecycle
//!
//! Refresh tokens are opaque random secrets handed to the client once.
//! Only a SHA-256 digest is persisted; presenting the secret again is the
//! only way to use it. Rotation revokes the presented token and mints a
//! replacement in one logical step, with the revocation done as an atomic
//! conditional write so a replayed or racing rotation loses cleanly.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration as ChronoDuration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use vitta_db::{CreateRefreshToken, RefreshTokenRepository, RefreshTokenRow};
use vitta_types::{ClientMeta, UserId};

use crate::crypto::digest_secret;
use crate::AuthError;

/// Raw entropy per refresh secret, before encoding
const SECRET_BYTES: usize = 48;

/// Refresh token store over a token repository
pub struct RefreshTokenStore<R: ?Sized> {
    repo: Arc<R>,
    ttl: ChronoDuration,
}

impl<R: RefreshTokenRepository + ?Sized> RefreshTokenStore<R> {
    pub fn new(repo: Arc<R>, ttl: std::time::Duration) -> Self {
        Self {
            repo,
            ttl: ChronoDuration::seconds(ttl.as_secs() as i64),
        }
    }

    /// Mint a fresh refresh token for a user.
    ///
    /// Returns the opaque secret (shown to the client exactly once) and
    /// the persisted row, which holds only the digest.
    pub async fn mint(
        &self,
        user_id: UserId,
        meta: &ClientMeta,
    ) -> Result<(String, RefreshTokenRow), AuthError> {
        let secret = generate_secret();
        let row = self
            .repo
            .create(CreateRefreshToken {
                token_digest: digest_secret(&secret),
                user_id: user_id.0,
                expires_at: Utc::now() + self.ttl,
                user_agent: meta.user_agent.clone(),
            })
            .await?;

        tracing::debug!(user_id = user_id.0, token_id = row.id, "minted refresh token");
        Ok((secret, row))
    }

    /// Rotate a presented refresh token: revoke it and mint a successor
    /// for the same user.
    ///
    /// The revocation is a single conditional write keyed on the digest
    /// still being active and unexpired. Presenting an unknown, expired,
    /// revoked, or already-rotated secret fails identically.
    pub async fn rotate(
        &self,
        secret: &str,
        meta: &ClientMeta,
    ) -> Result<(String, RefreshTokenRow), AuthError> {
        let digest = digest_secret(secret);
        let old = self
            .repo
            .revoke_usable(&digest, meta.ip.as_deref())
            .await?
            .ok_or_else(|| {
                tracing::debug!("refresh token rotation failed: token not usable");
                AuthError::InvalidCredentials
            })?;

        let new_secret = generate_secret();
        let row = self
            .repo
            .create(CreateRefreshToken {
                token_digest: digest_secret(&new_secret),
                user_id: old.user_id,
                expires_at: Utc::now() + self.ttl,
                // Prefer the rotating client's UA, fall back to the original
                user_agent: meta.user_agent.clone().or(old.user_agent),
            })
            .await?;

        tracing::debug!(
            user_id = old.user_id,
            old_token_id = old.id,
            new_token_id = row.id,
            "rotated refresh token"
        );
        Ok((new_secret, row))
    }

    /// Look up the user behind a presented refresh token without
    /// consuming it.
    pub async fn peek(&self, secret: &str) -> Result<RefreshTokenRow, AuthError> {
        self.repo
            .find_usable_by_digest(&digest_secret(secret))
            .await?
            .ok_or(AuthError::InvalidCredentials)
    }

    /// Revoke a presented refresh token.
    ///
    /// Idempotent: revoking an unknown or already-revoked token succeeds
    /// silently. Returns whether a live row was actually flipped.
    pub async fn revoke(&self, secret: &str, meta: &ClientMeta) -> Result<bool, AuthError> {
        let digest = digest_secret(secret);
        match self.repo.revoke_usable(&digest, meta.ip.as_deref()).await? {
            Some(row) => {
                tracing::debug!(user_id = row.user_id, token_id = row.id, "revoked refresh token");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Revoke every active refresh token for a user
    pub async fn revoke_all(&self, user_id: UserId) -> Result<u64, AuthError> {
        let revoked = self.repo.revoke_all_for_user(user_id.0).await?;
        if revoked > 0 {
            tracing::info!(user_id = user_id.0, revoked, "revoked all refresh tokens");
        }
        Ok(revoked)
    }

    /// Flip expired-but-still-active rows to inactive.
    ///
    /// Hygiene only; rotation and lookup already refuse expired rows.
    pub async fn sweep_expired(&self) -> Result<u64, AuthError> {
        let swept = self.repo.sweep_expired().await?;
        if swept > 0 {
            tracing::debug!(swept, "swept expired refresh tokens");
        }
        Ok(swept)
    }
}

/// Generate an opaque URL-safe refresh secret
fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

//! PostgreSQL refresh token repository implementation

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::DbResult;
use crate::models::RefreshTokenRow;
use crate::repo::{CreateRefreshToken, RefreshTokenRepository};

const TOKEN_COLUMNS: &str = "id, token_digest, user_id, is_active, created_at, expires_at, \
                             revoked_at, revoked_by_ip, user_agent";

/// PostgreSQL refresh token repository
#[derive(Clone)]
pub struct PgRefreshTokenRepository {
    pool: PgPool,
}

impl PgRefreshTokenRepository {
    /// Create a new refresh token repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for PgRefreshTokenRepository {
    async fn create(&self, token: CreateRefreshToken) -> DbResult<RefreshTokenRow> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(&format!(
            r#"
            INSERT INTO refresh_tokens (token_digest, user_id, expires_at, user_agent)
            VALUES ($1, $2, $3, $4)
            RETURNING {TOKEN_COLUMNS}
            "#
        ))
        .bind(&token.token_digest)
        .bind(token.user_id)
        .bind(token.expires_at)
        .bind(&token.user_agent)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_usable_by_digest(&self, digest: &str) -> DbResult<Option<RefreshTokenRow>> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(&format!(
            r#"
            SELECT {TOKEN_COLUMNS}
            FROM refresh_tokens
            WHERE token_digest = $1 AND is_active AND expires_at > NOW()
            "#
        ))
        .bind(digest)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn revoke_usable(
        &self,
        digest: &str,
        ip: Option<&str>,
    ) -> DbResult<Option<RefreshTokenRow>> {
        // The WHERE clause re-checks is_active inside the UPDATE itself, so
        // two racing calls for the same digest cannot both match.
        let row = sqlx::query_as::<_, RefreshTokenRow>(&format!(
            r#"
            UPDATE refresh_tokens
            SET is_active = FALSE, revoked_at = NOW(), revoked_by_ip = $2
            WHERE token_digest = $1 AND is_active AND expires_at > NOW()
            RETURNING {TOKEN_COLUMNS}
            "#
        ))
        .bind(digest)
        .bind(ip)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn revoke_all_for_user(&self, user_id: i64) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET is_active = FALSE, revoked_at = NOW()
            WHERE user_id = $1 AND is_active
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_by_user_id(&self, user_id: i64) -> DbResult<Vec<RefreshTokenRow>> {
        let rows = sqlx::query_as::<_, RefreshTokenRow>(&format!(
            r#"
            SELECT {TOKEN_COLUMNS}
            FROM refresh_tokens
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn sweep_expired(&self) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET is_active = FALSE, revoked_at = NOW()
            WHERE is_active AND expires_at <= NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

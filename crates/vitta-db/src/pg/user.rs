//! PostgreSQL user repository implementation

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{DbError, DbResult};
use crate::models::UserRow;
use crate::repo::{CreateUser, ProfileUpdate, UserRepository};

const USER_COLUMNS: &str = "id, email, password_hash, google_id, full_name, given_name, \
                            family_name, picture_url, email_verified, is_active, \
                            last_login_at, created_at, updated_at";

/// PostgreSQL user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i64) -> DbResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_google_id(&self, google_id: &str) -> DbResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE google_id = $1"
        ))
        .bind(google_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: CreateUser) -> DbResult<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (email, password_hash, google_id, full_name, given_name,
                               family_name, picture_url, email_verified)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.google_id)
        .bind(&user.full_name)
        .bind(&user.given_name)
        .bind(&user.family_name)
        .bind(&user.picture_url)
        .bind(user.email_verified)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_sqlx)?;

        Ok(row)
    }

    async fn link_google_id(&self, id: i64, google_id: &str) -> DbResult<()> {
        sqlx::query("UPDATE users SET google_id = $1, updated_at = NOW() WHERE id = $2")
            .bind(google_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DbError::from_sqlx)?;

        Ok(())
    }

    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> DbResult<UserRow> {
        // COALESCE keeps existing values for fields the update leaves unset
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET full_name = COALESCE($1, full_name),
                given_name = COALESCE($2, given_name),
                family_name = COALESCE($3, family_name),
                picture_url = COALESCE($4, picture_url),
                updated_at = NOW()
            WHERE id = $5
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&update.full_name)
        .bind(&update.given_name)
        .bind(&update.family_name)
        .bind(&update.picture_url)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(row)
    }

    async fn set_password_hash(&self, id: i64, password_hash: &str) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
                .bind(password_hash)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    async fn set_active(&self, id: i64, active: bool) -> DbResult<()> {
        sqlx::query("UPDATE users SET is_active = $1, updated_at = NOW() WHERE id = $2")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn touch_last_login(&self, id: i64) -> DbResult<()> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

//! Mock repositories for testing

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use vitta_db::{
    CreateRefreshToken, CreateUser, DbError, DbResult, ProfileUpdate, RefreshTokenRepository,
    RefreshTokenRow, UserRepository, UserRow,
};

/// In-memory user repository for testing
#[derive(Default, Clone)]
pub struct MockUserRepository {
    users: Arc<DashMap<i64, UserRow>>,
    by_email: Arc<DashMap<String, i64>>,
    by_google_id: Arc<DashMap<String, i64>>,
    next_id: Arc<AtomicI64>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a test user directly
    #[allow(dead_code)]
    pub fn insert_user(&self, user: UserRow) {
        self.by_email.insert(user.email.clone(), user.id);
        if let Some(ref gid) = user.google_id {
            self.by_google_id.insert(gid.clone(), user.id);
        }
        self.next_id.fetch_max(user.id, Ordering::SeqCst);
        self.users.insert(user.id, user);
    }

    /// Build a plain active user row with the given id and email
    #[allow(dead_code)]
    pub fn test_user(id: i64, email: &str) -> UserRow {
        UserRow {
            id,
            email: email.to_string(),
            password_hash: None,
            google_id: None,
            full_name: None,
            given_name: None,
            family_name: None,
            picture_url: None,
            email_verified: false,
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: i64) -> DbResult<Option<UserRow>> {
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        Ok(self
            .by_email
            .get(email)
            .and_then(|id| self.users.get(id.value()).map(|r| r.value().clone())))
    }

    async fn find_by_google_id(&self, google_id: &str) -> DbResult<Option<UserRow>> {
        Ok(self
            .by_google_id
            .get(google_id)
            .and_then(|id| self.users.get(id.value()).map(|r| r.value().clone())))
    }

    async fn create(&self, user: CreateUser) -> DbResult<UserRow> {
        if self.by_email.contains_key(&user.email) {
            return Err(DbError::UniqueViolation("users_email_key".to_string()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let row = UserRow {
            id,
            email: user.email,
            password_hash: user.password_hash,
            google_id: user.google_id,
            full_name: user.full_name,
            given_name: user.given_name,
            family_name: user.family_name,
            picture_url: user.picture_url,
            email_verified: user.email_verified,
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.by_email.insert(row.email.clone(), id);
        if let Some(ref gid) = row.google_id {
            self.by_google_id.insert(gid.clone(), id);
        }
        self.users.insert(id, row.clone());
        Ok(row)
    }

    async fn link_google_id(&self, id: i64, google_id: &str) -> DbResult<()> {
        let mut user = self.users.get_mut(&id).ok_or(DbError::NotFound)?;
        user.google_id = Some(google_id.to_string());
        user.updated_at = Utc::now();
        self.by_google_id.insert(google_id.to_string(), id);
        Ok(())
    }

    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> DbResult<UserRow> {
        let mut user = self.users.get_mut(&id).ok_or(DbError::NotFound)?;
        if let Some(v) = update.full_name {
            user.full_name = Some(v);
        }
        if let Some(v) = update.given_name {
            user.given_name = Some(v);
        }
        if let Some(v) = update.family_name {
            user.family_name = Some(v);
        }
        if let Some(v) = update.picture_url {
            user.picture_url = Some(v);
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_password_hash(&self, id: i64, password_hash: &str) -> DbResult<()> {
        let mut user = self.users.get_mut(&id).ok_or(DbError::NotFound)?;
        user.password_hash = Some(password_hash.to_string());
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn set_active(&self, id: i64, active: bool) -> DbResult<()> {
        let mut user = self.users.get_mut(&id).ok_or(DbError::NotFound)?;
        user.is_active = active;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn touch_last_login(&self, id: i64) -> DbResult<()> {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }
}

/// In-memory refresh token repository for testing.
///
/// `revoke_usable` mutates the row under the digest's map entry lock, so
/// two racing revocations of the same digest serialize and exactly one
/// observes the active row, matching the conditional-UPDATE semantics of
/// the real store.
#[derive(Default, Clone)]
pub struct MockRefreshTokenRepository {
    by_digest: Arc<DashMap<String, RefreshTokenRow>>,
    next_id: Arc<AtomicI64>,
}

impl MockRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total rows held, regardless of state
    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.by_digest.len()
    }
}

#[async_trait]
impl RefreshTokenRepository for MockRefreshTokenRepository {
    async fn create(&self, token: CreateRefreshToken) -> DbResult<RefreshTokenRow> {
        if self.by_digest.contains_key(&token.token_digest) {
            return Err(DbError::UniqueViolation(
                "refresh_tokens_token_digest_key".to_string(),
            ));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let row = RefreshTokenRow {
            id,
            token_digest: token.token_digest.clone(),
            user_id: token.user_id,
            is_active: true,
            created_at: Utc::now(),
            expires_at: token.expires_at,
            revoked_at: None,
            revoked_by_ip: None,
            user_agent: token.user_agent,
        };
        self.by_digest.insert(token.token_digest, row.clone());
        Ok(row)
    }

    async fn find_usable_by_digest(&self, digest: &str) -> DbResult<Option<RefreshTokenRow>> {
        Ok(self
            .by_digest
            .get(digest)
            .filter(|r| r.is_usable())
            .map(|r| r.value().clone()))
    }

    async fn revoke_usable(
        &self,
        digest: &str,
        ip: Option<&str>,
    ) -> DbResult<Option<RefreshTokenRow>> {
        let Some(mut row) = self.by_digest.get_mut(digest) else {
            return Ok(None);
        };
        if !row.is_usable() {
            return Ok(None);
        }
        row.is_active = false;
        row.revoked_at = Some(Utc::now());
        row.revoked_by_ip = ip.map(str::to_string);
        Ok(Some(row.clone()))
    }

    async fn revoke_all_for_user(&self, user_id: i64) -> DbResult<u64> {
        let mut count = 0;
        for mut r in self.by_digest.iter_mut() {
            if r.user_id == user_id && r.is_active {
                r.is_active = false;
                r.revoked_at = Some(Utc::now());
                count += 1;
            }
        }
        Ok(count)
    }

    async fn find_by_user_id(&self, user_id: i64) -> DbResult<Vec<RefreshTokenRow>> {
        let mut rows: Vec<RefreshTokenRow> = self
            .by_digest
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn sweep_expired(&self) -> DbResult<u64> {
        let now = Utc::now();
        let mut count = 0;
        for mut r in self.by_digest.iter_mut() {
            if r.is_active && r.expires_at <= now {
                r.is_active = false;
                r.revoked_at = Some(now);
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_mock_user_repo_crud() {
        let repo = MockUserRepository::new();

        let user = repo
            .create(CreateUser {
                email: "test@example.com".to_string(),
                password_hash: Some("digest".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(repo.find_by_id(user.id).await.unwrap().is_some());
        assert!(repo
            .find_by_email("test@example.com")
            .await
            .unwrap()
            .is_some());

        // Duplicate email rejected
        let dup = repo
            .create(CreateUser {
                email: "test@example.com".to_string(),
                ..Default::default()
            })
            .await;
        assert!(matches!(dup, Err(DbError::UniqueViolation(_))));

        repo.link_google_id(user.id, "g-123").await.unwrap();
        assert!(repo.find_by_google_id("g-123").await.unwrap().is_some());

        repo.set_active(user.id, false).await.unwrap();
        let row = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert!(!row.is_active);
    }

    #[tokio::test]
    async fn test_mock_token_repo_revoke_usable_once() {
        let repo = MockRefreshTokenRepository::new();
        repo.create(CreateRefreshToken {
            token_digest: "d1".to_string(),
            user_id: 1,
            expires_at: Utc::now() + Duration::days(30),
            user_agent: None,
        })
        .await
        .unwrap();

        let first = repo.revoke_usable("d1", Some("10.0.0.1")).await.unwrap();
        assert!(first.is_some());

        let second = repo.revoke_usable("d1", None).await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_mock_token_repo_expired_not_usable() {
        let repo = MockRefreshTokenRepository::new();
        repo.create(CreateRefreshToken {
            token_digest: "old".to_string(),
            user_id: 1,
            expires_at: Utc::now() - Duration::minutes(1),
            user_agent: None,
        })
        .await
        .unwrap();

        assert!(repo.find_usable_by_digest("old").await.unwrap().is_none());
        assert!(repo.revoke_usable("old", None).await.unwrap().is_none());
        assert_eq!(repo.sweep_expired().await.unwrap(), 1);
    }
}

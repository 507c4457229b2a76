//! Auth service - ties together credentials, tokens, and identity linking

use std::sync::Arc;

use vitta_db::{CreateUser, ProfileUpdate, UserRepository, UserRow};
use vitta_db::RefreshTokenRepository;
use vitta_types::{normalize_email, ClientMeta, Identity, TokenPair, UserId};

use crate::{
    config::AuthConfig,
    google::{GoogleClaims, GoogleVerifier},
    password::{hash_password, verify_password},
    refresh::RefreshTokenStore,
    token::AccessTokenKeys,
    AuthError,
};

/// Minimum accepted password length for registration and password changes
const MIN_PASSWORD_LEN: usize = 8;

/// Input for email/password registration
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Result of any successful authentication: the account plus a token pair
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub user: UserRow,
    pub tokens: TokenPair,
}

/// Authentication service
///
/// Provides unified interface for:
/// - Email/password registration and login
/// - Google sign-in with identity linking
/// - Refresh-token rotation and revocation
/// - Resolving access tokens to a caller identity
pub struct AuthService<U: UserRepository + ?Sized, R: RefreshTokenRepository + ?Sized> {
    config: AuthConfig,
    users: Arc<U>,
    refresh: RefreshTokenStore<R>,
    keys: AccessTokenKeys,
    google: GoogleVerifier,
}

impl<U: UserRepository + ?Sized, R: RefreshTokenRepository + ?Sized> AuthService<U, R> {
    /// Create a new auth service
    pub fn new(config: AuthConfig, users: Arc<U>, tokens: Arc<R>) -> Self {
        Self {
            keys: AccessTokenKeys::new(&config),
            google: GoogleVerifier::new(config.clone()),
            refresh: RefreshTokenStore::new(tokens, config.refresh_ttl),
            users,
            config,
        }
    }

    /// Create a service with a pre-built Google verifier (shared HTTP client)
    pub fn with_google_verifier(
        config: AuthConfig,
        users: Arc<U>,
        tokens: Arc<R>,
        google: GoogleVerifier,
    ) -> Self {
        Self {
            keys: AccessTokenKeys::new(&config),
            refresh: RefreshTokenStore::new(tokens, config.refresh_ttl),
            google,
            users,
            config,
        }
    }

    // =========================================================================
    // Registration and Login
    // =========================================================================

    /// Register a new account with email and password
    pub async fn register(&self, input: NewUser, meta: &ClientMeta) -> Result<AuthOutcome, AuthError> {
        let email = normalize_email(&input.email);
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::Validation("invalid email address".to_string()));
        }
        if input.password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let password_hash = hash_password(&input.password)?;
        // A unique violation on email maps to EmailTaken in From<DbError>
        let user = self
            .users
            .create(CreateUser {
                email,
                password_hash: Some(password_hash),
                full_name: input.full_name,
                ..Default::default()
            })
            .await?;

        tracing::info!(user_id = user.id, "registered new account");
        self.finish_auth(user, meta).await
    }

    /// Authenticate with email and password.
    ///
    /// A missing account, an account without a password (federated only),
    /// and a wrong password all fail identically.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        meta: &ClientMeta,
    ) -> Result<AuthOutcome, AuthError> {
        let email = normalize_email(email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let verified = user
            .password_hash
            .as_deref()
            .is_some_and(|digest| verify_password(password, digest));
        if !verified {
            tracing::debug!(user_id = user.id, "login failed: bad credentials");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            tracing::debug!(user_id = user.id, "login refused: account disabled");
            return Err(AuthError::AccountDisabled);
        }

        self.finish_auth(user, meta).await
    }

    // =========================================================================
    // Google Sign-In
    // =========================================================================

    /// Authenticate with a Google ID token.
    ///
    /// Resolution order: existing account by Google subject, then existing
    /// account by email (which links the subject), then a new account.
    /// Profile attributes merge first-write-wins: Google values fill only
    /// fields the account does not already have.
    ///
    /// The boolean is true when the account was provisioned by this call.
    pub async fn google_sign_in(
        &self,
        id_token: &str,
        meta: &ClientMeta,
    ) -> Result<(AuthOutcome, bool), AuthError> {
        let claims = self.google.verify(id_token).await?;
        if !claims.email_verified {
            tracing::debug!("google sign-in refused: email not verified");
            return Err(AuthError::InvalidCredentials);
        }

        let (user, is_new_account) = self.resolve_google_account(&claims).await?;
        if !user.is_active {
            tracing::debug!(user_id = user.id, "google sign-in refused: account disabled");
            return Err(AuthError::AccountDisabled);
        }

        let outcome = self.finish_auth(user, meta).await?;
        Ok((outcome, is_new_account))
    }

    /// Find or create the account for a set of verified Google claims
    async fn resolve_google_account(
        &self,
        claims: &GoogleClaims,
    ) -> Result<(UserRow, bool), AuthError> {
        // Returning user: matched by Google subject
        if let Some(user) = self.users.find_by_google_id(&claims.sub).await? {
            return Ok((self.merge_google_profile(user, claims).await?, false));
        }

        // Existing email/password account: link the Google subject to it
        let email = normalize_email(&claims.email);
        if let Some(user) = self.users.find_by_email(&email).await? {
            self.users.link_google_id(user.id, &claims.sub).await?;
            tracing::info!(user_id = user.id, "linked google identity to existing account");
            return Ok((self.merge_google_profile(user, claims).await?, false));
        }

        // First sight of this identity: provision an account
        let user = self
            .users
            .create(CreateUser {
                email,
                google_id: Some(claims.sub.clone()),
                full_name: claims.name.clone(),
                given_name: claims.given_name.clone(),
                family_name: claims.family_name.clone(),
                picture_url: claims.picture.clone(),
                email_verified: true,
                ..Default::default()
            })
            .await?;

        tracing::info!(user_id = user.id, "provisioned account from google sign-in");
        Ok((user, true))
    }

    /// Fill profile fields the account is missing from Google claims.
    ///
    /// Existing values always win; a later sign-in never overwrites them.
    async fn merge_google_profile(
        &self,
        user: UserRow,
        claims: &GoogleClaims,
    ) -> Result<UserRow, AuthError> {
        let update = ProfileUpdate {
            full_name: user.full_name.is_none().then(|| claims.name.clone()).flatten(),
            given_name: user
                .given_name
                .is_none()
                .then(|| claims.given_name.clone())
                .flatten(),
            family_name: user
                .family_name
                .is_none()
                .then(|| claims.family_name.clone())
                .flatten(),
            picture_url: user
                .picture_url
                .is_none()
                .then(|| claims.picture.clone())
                .flatten(),
        };

        if update.is_empty() {
            return Ok(user);
        }
        Ok(self.users.update_profile(user.id, update).await?)
    }

    // =========================================================================
    // Token Lifecycle
    // =========================================================================

    /// Rotate a refresh token and issue a new token pair.
    ///
    /// The presented token is consumed; presenting it again fails. The new
    /// pair is bound to the same account.
    pub async fn refresh(&self, refresh_token: &str, meta: &ClientMeta) -> Result<TokenPair, AuthError> {
        let (new_secret, row) = self.refresh.rotate(refresh_token, meta).await?;

        let user = self
            .users
            .find_by_id(row.user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        let access = self
            .keys
            .issue(user.user_id(), &user.email, self.config.access_ttl)?;
        Ok(TokenPair::new(
            access,
            new_secret,
            self.config.access_ttl.as_secs(),
        ))
    }

    /// Revoke a presented refresh token.
    ///
    /// Idempotent; succeeds whether or not the token was live.
    pub async fn logout(&self, refresh_token: &str, meta: &ClientMeta) -> Result<(), AuthError> {
        self.refresh.revoke(refresh_token, meta).await?;
        Ok(())
    }

    /// Revoke every refresh token a user holds (all-device sign-out)
    pub async fn logout_everywhere(&self, user_id: UserId) -> Result<u64, AuthError> {
        self.refresh.revoke_all(user_id).await
    }

    /// Resolve an access token to the caller's identity.
    ///
    /// Signature, issuer, audience, and expiry checks all fail with the
    /// same credential error; a valid token for a disabled account fails
    /// distinctly.
    pub async fn resolve(&self, access_token: &str) -> Result<Identity, AuthError> {
        let claims = self.keys.validate(access_token)?;
        let user_id = claims.user_id().ok_or(AuthError::InvalidCredentials)?;

        let user = self
            .users
            .find_by_id(user_id.0)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        Ok(Identity {
            user_id: user.user_id(),
            email: user.email,
            is_active: user.is_active,
        })
    }

    /// Flip expired-but-active refresh tokens to revoked (periodic hygiene)
    pub async fn sweep_expired_tokens(&self) -> Result<u64, AuthError> {
        self.refresh.sweep_expired().await
    }

    // =========================================================================
    // Account Management
    // =========================================================================

    /// Load the full profile row for a user
    pub async fn profile(&self, user_id: UserId) -> Result<UserRow, AuthError> {
        self.users
            .find_by_id(user_id.0)
            .await?
            .ok_or(AuthError::InvalidCredentials)
    }

    /// Update profile attributes; `None` fields are left untouched
    pub async fn update_profile(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> Result<UserRow, AuthError> {
        if update.is_empty() {
            return self.profile(user_id).await;
        }
        Ok(self.users.update_profile(user_id.0, update).await?)
    }

    /// Set (or replace) the account password.
    ///
    /// Every outstanding refresh token is revoked; other devices must
    /// sign in again with the new password.
    pub async fn set_password(&self, user_id: UserId, new_password: &str) -> Result<(), AuthError> {
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let digest = hash_password(new_password)?;
        self.users.set_password_hash(user_id.0, &digest).await?;
        self.refresh.revoke_all(user_id).await?;

        tracing::info!(user_id = user_id.0, "password changed, refresh tokens revoked");
        Ok(())
    }

    /// Enable or disable an account.
    ///
    /// Disabling also revokes every outstanding refresh token.
    pub async fn set_account_active(&self, user_id: UserId, active: bool) -> Result<(), AuthError> {
        self.users.set_active(user_id.0, active).await?;
        if !active {
            self.refresh.revoke_all(user_id).await?;
        }
        Ok(())
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate the JWKS cache (call when Google rotates keys)
    pub async fn invalidate_jwks_cache(&self) {
        self.google.invalidate_cache().await;
    }

    /// Issue a token pair and record the login
    async fn finish_auth(&self, user: UserRow, meta: &ClientMeta) -> Result<AuthOutcome, AuthError> {
        let access = self
            .keys
            .issue(user.user_id(), &user.email, self.config.access_ttl)?;
        let (refresh_secret, _) = self.refresh.mint(user.user_id(), meta).await?;
        self.users.touch_last_login(user.id).await?;

        Ok(AuthOutcome {
            tokens: TokenPair::new(access, refresh_secret, self.config.access_ttl.as_secs()),
            user,
        })
    }
}

impl<U: UserRepository + ?Sized, R: RefreshTokenRepository + ?Sized> std::fmt::Debug
    for AuthService<U, R>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("issuer", &self.config.issuer)
            .finish_non_exhaustive()
    }
}

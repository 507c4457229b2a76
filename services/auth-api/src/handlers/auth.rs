//! Authentication handlers (register, login, google, refresh, logout, me)

use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use vitta_auth_core::{verify_password, NewUser};
use vitta_db::{ProfileUpdate, UserRow};
use vitta_types::{ClientMeta, TokenPair};

use crate::error::{ApiError, ApiResult};
use crate::extractors::{ApiJson, AuthUser};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleSignInRequest {
    pub id_token: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    /// Required when the account already has a password
    pub current_password: Option<String>,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserInfo,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture_url: Option<String>,
    pub email_verified: bool,
    pub google_linked: bool,
    pub created_at: String,
}

impl From<UserRow> for UserInfo {
    fn from(user: UserRow) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            given_name: user.given_name,
            family_name: user.family_name,
            picture_url: user.picture_url,
            email_verified: user.email_verified,
            google_linked: user.google_id.is_some(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GoogleAuthResponse {
    pub user: UserInfo,
    pub is_new_account: bool,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Client metadata recorded against refresh tokens
fn client_meta(addr: SocketAddr, headers: &HeaderMap) -> ClientMeta {
    ClientMeta::new(
        Some(addr.ip().to_string()),
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
///
/// Create an account with email and password
pub async fn register(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let meta = client_meta(addr, &headers);

    let outcome = state
        .auth
        .register(
            NewUser {
                email: req.email,
                password: req.password,
                full_name: req.full_name,
            },
            &meta,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserInfo::from(outcome.user),
            tokens: outcome.tokens,
        }),
    ))
}

/// POST /auth/login
///
/// Authenticate with email and password
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let meta = client_meta(addr, &headers);

    let outcome = state.auth.login(&req.email, &req.password, &meta).await?;

    Ok(Json(AuthResponse {
        user: UserInfo::from(outcome.user),
        tokens: outcome.tokens,
    }))
}

/// POST /auth/google
///
/// Authenticate with a Google ID token. Rate limited per IP.
pub async fn google(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<GoogleSignInRequest>,
) -> ApiResult<Json<GoogleAuthResponse>> {
    state.google_limiter.check(addr.ip()).await?;

    let meta = client_meta(addr, &headers);
    let (outcome, is_new_account) = state.auth.google_sign_in(&req.id_token, &meta).await?;

    Ok(Json(GoogleAuthResponse {
        user: UserInfo::from(outcome.user),
        is_new_account,
        tokens: outcome.tokens,
    }))
}

/// POST /auth/refresh
///
/// Rotate a refresh token and return a new token pair
pub async fn refresh(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    let meta = client_meta(addr, &headers);
    let pair = state.auth.refresh(&req.refresh_token, &meta).await?;
    Ok(Json(pair))
}

/// POST /auth/logout
///
/// Revoke the presented refresh token. Always succeeds.
pub async fn logout(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<LogoutRequest>,
) -> ApiResult<Json<LogoutResponse>> {
    let meta = client_meta(addr, &headers);
    state.auth.logout(&req.refresh_token, &meta).await?;
    Ok(Json(LogoutResponse { success: true }))
}

/// GET /auth/me
///
/// Current user's profile
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<UserInfo>> {
    let user = state.auth.profile(auth_user.user_id).await?;
    Ok(Json(UserInfo::from(user)))
}

/// PUT /auth/me
///
/// Update profile attributes; omitted fields are left untouched
pub async fn update_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<UserInfo>> {
    let user = state
        .auth
        .update_profile(
            auth_user.user_id,
            ProfileUpdate {
                full_name: req.full_name,
                given_name: req.given_name,
                family_name: req.family_name,
                picture_url: req.picture_url,
            },
        )
        .await?;
    Ok(Json(UserInfo::from(user)))
}

/// POST /auth/password
///
/// Set or change the account password. Accounts that already have one must
/// present it; Google-only accounts set their first password directly.
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> ApiResult<Json<LogoutResponse>> {
    let user = state.auth.profile(auth_user.user_id).await?;

    if let Some(ref digest) = user.password_hash {
        let current = req
            .current_password
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest("current password is required".to_string()))?;
        if !verify_password(current, digest) {
            return Err(ApiError::from(
                vitta_auth_core::AuthError::InvalidCredentials,
            ));
        }
    }

    state
        .auth
        .set_password(auth_user.user_id, &req.new_password)
        .await?;

    Ok(Json(LogoutResponse { success: true }))
}

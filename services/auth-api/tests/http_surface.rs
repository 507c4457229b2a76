//! HTTP surface tests.
//!
//! Drive the full router over in-memory repositories and assert on the
//! wire contract: status codes, the error envelope, and the Bearer
//! challenge on unauthorized responses.

mod common;

use axum::http::{header, StatusCode};
use serde_json::json;

use common::{body_json, get, post_json, post_json_authed, post_raw, put_json_authed, test_app};

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_creates_account_and_returns_tokens() {
    let app = test_app(10);

    let resp = post_json(
        &app,
        "/auth/register",
        json!({
            "email": "  Ada@Example.com ",
            "password": "horse-staple-9",
            "full_name": "Ada Lovelace"
        }),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["full_name"], "Ada Lovelace");
    assert_eq!(body["token_type"], "Bearer");
    assert!(!body["access_token"].as_str().unwrap().is_empty());
    assert!(!body["refresh_token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let app = test_app(10);

    let first = post_json(
        &app,
        "/auth/register",
        json!({"email": "dup@example.com", "password": "horse-staple-9"}),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = post_json(
        &app,
        "/auth/register",
        json!({"email": "dup@example.com", "password": "other-password"}),
    )
    .await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let body = body_json(second).await;
    assert_eq!(body["error"]["code"], "EMAIL_TAKEN");
}

#[tokio::test]
async fn test_register_with_missing_password_is_bad_request() {
    let app = test_app(10);

    // Incomplete body must not leak the framework's 422 rejection
    let resp = post_json(&app, "/auth/register", json!({"email": "x@example.com"})).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn test_register_with_malformed_json_is_bad_request() {
    let app = test_app(10);

    let resp = post_raw(&app, "/auth/register", "{not json").await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_register_with_short_password_is_validation_error() {
    let app = test_app(10);

    let resp = post_json(
        &app,
        "/auth/register",
        json!({"email": "x@example.com", "password": "short"}),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized_with_challenge() {
    let app = test_app(10);

    post_json(
        &app,
        "/auth/register",
        json!({"email": "ada@example.com", "password": "horse-staple-9"}),
    )
    .await;

    let resp = post_json(
        &app,
        "/auth/login",
        json!({"email": "ada@example.com", "password": "wrong-password"}),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        resp.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_login_with_correct_password_succeeds() {
    let app = test_app(10);

    post_json(
        &app,
        "/auth/register",
        json!({"email": "ada@example.com", "password": "horse-staple-9"}),
    )
    .await;

    let resp = post_json(
        &app,
        "/auth/login",
        json!({"email": "ada@example.com", "password": "horse-staple-9"}),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert!(!body["access_token"].as_str().unwrap().is_empty());
}

// ============================================================================
// Refresh rotation
// ============================================================================

#[tokio::test]
async fn test_refresh_rotates_and_rejects_replay() {
    let app = test_app(10);

    let registered = post_json(
        &app,
        "/auth/register",
        json!({"email": "ada@example.com", "password": "horse-staple-9"}),
    )
    .await;
    let body = body_json(registered).await;
    let original = body["refresh_token"].as_str().unwrap().to_string();

    let rotated = post_json(&app, "/auth/refresh", json!({"refresh_token": original})).await;
    assert_eq!(rotated.status(), StatusCode::OK);
    let rotated_body = body_json(rotated).await;
    let successor = rotated_body["refresh_token"].as_str().unwrap();
    assert_ne!(successor, original);

    // The consumed secret is dead; replaying it is a credential failure
    let replay = post_json(&app, "/auth/refresh", json!({"refresh_token": original})).await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    let replay_body = body_json(replay).await;
    assert_eq!(replay_body["error"]["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_logout_succeeds_and_kills_the_token() {
    let app = test_app(10);

    let registered = post_json(
        &app,
        "/auth/register",
        json!({"email": "ada@example.com", "password": "horse-staple-9"}),
    )
    .await;
    let body = body_json(registered).await;
    let refresh_token = body["refresh_token"].as_str().unwrap().to_string();

    let logout = post_json(&app, "/auth/logout", json!({"refresh_token": refresh_token})).await;
    assert_eq!(logout.status(), StatusCode::OK);
    assert_eq!(body_json(logout).await["success"], true);

    let refresh = post_json(&app, "/auth/refresh", json!({"refresh_token": refresh_token})).await;
    assert_eq!(refresh.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_with_unknown_token_still_succeeds() {
    let app = test_app(10);

    let resp = post_json(
        &app,
        "/auth/logout",
        json!({"refresh_token": "never-issued"}),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["success"], true);
}

// ============================================================================
// Authenticated profile endpoints
// ============================================================================

#[tokio::test]
async fn test_me_requires_bearer_token() {
    let app = test_app(10);

    let resp = get(&app, "/auth/me", None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        resp.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );

    let garbage = get(&app, "/auth/me", Some("not-a-real-token")).await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_returns_and_updates_profile() {
    let app = test_app(10);

    let registered = post_json(
        &app,
        "/auth/register",
        json!({"email": "ada@example.com", "password": "horse-staple-9"}),
    )
    .await;
    let body = body_json(registered).await;
    let access = body["access_token"].as_str().unwrap().to_string();

    let me = get(&app, "/auth/me", Some(&access)).await;
    assert_eq!(me.status(), StatusCode::OK);
    assert_eq!(body_json(me).await["email"], "ada@example.com");

    let updated = put_json_authed(
        &app,
        "/auth/me",
        &access,
        json!({"full_name": "Ada Lovelace"}),
    )
    .await;
    assert_eq!(updated.status(), StatusCode::OK);
    assert_eq!(body_json(updated).await["full_name"], "Ada Lovelace");
}

#[tokio::test]
async fn test_password_change_requires_current_password() {
    let app = test_app(10);

    let registered = post_json(
        &app,
        "/auth/register",
        json!({"email": "ada@example.com", "password": "horse-staple-9"}),
    )
    .await;
    let body = body_json(registered).await;
    let access = body["access_token"].as_str().unwrap().to_string();

    // Account has a password, so omitting the current one is a 400
    let missing = post_json_authed(
        &app,
        "/auth/password",
        &access,
        json!({"new_password": "brand-new-pass"}),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(missing).await["error"]["code"], "BAD_REQUEST");

    let wrong = post_json_authed(
        &app,
        "/auth/password",
        &access,
        json!({"current_password": "wrong-guess", "new_password": "brand-new-pass"}),
    )
    .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let correct = post_json_authed(
        &app,
        "/auth/password",
        &access,
        json!({"current_password": "horse-staple-9", "new_password": "brand-new-pass"}),
    )
    .await;
    assert_eq!(correct.status(), StatusCode::OK);

    // Old credential is gone, new one works
    let old_login = post_json(
        &app,
        "/auth/login",
        json!({"email": "ada@example.com", "password": "horse-staple-9"}),
    )
    .await;
    assert_eq!(old_login.status(), StatusCode::UNAUTHORIZED);

    let new_login = post_json(
        &app,
        "/auth/login",
        json!({"email": "ada@example.com", "password": "brand-new-pass"}),
    )
    .await;
    assert_eq!(new_login.status(), StatusCode::OK);
}

// ============================================================================
// Google sign-in rate limiting
// ============================================================================

#[tokio::test]
async fn test_google_sign_in_is_rate_limited_per_ip() {
    // One request per minute: the first is judged on its (bad) token,
    // the second never reaches verification
    let app = test_app(1);

    let first = post_json(&app, "/auth/google", json!({"id_token": "not-a-jwt"})).await;
    assert_eq!(first.status(), StatusCode::UNAUTHORIZED);

    let second = post_json(&app, "/auth/google", json!({"id_token": "not-a-jwt"})).await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(second).await;
    assert_eq!(body["error"]["code"], "RATE_LIMIT_EXCEEDED");
}

// ============================================================================
// Health endpoints
// ============================================================================

#[tokio::test]
async fn test_health_is_ok_and_readiness_degrades_without_database() {
    let app = test_app(10);

    let health = get(&app, "/health", None).await;
    assert_eq!(health.status(), StatusCode::OK);

    // The fixture pool points at a closed port
    let ready = get(&app, "/ready", None).await;
    assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
}

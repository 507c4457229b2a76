//! Vitta Auth API
//!
//! HTTP authentication service: registration, login, Google sign-in, and
//! the refresh-token lifecycle.

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod rate_limit;
pub mod state;

use state::AppState;

/// Rate-limit buckets untouched for this long are dropped by the sweeper
const LIMITER_IDLE_WINDOW: Duration = Duration::from_secs(600);

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/google", post(handlers::google))
        .route("/auth/refresh", post(handlers::refresh))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/me", get(handlers::me).put(handlers::update_me))
        .route("/auth/password", post(handlers::change_password))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run periodic hygiene on a fixed interval: flip expired-but-active
/// refresh tokens and drop idle rate-limit buckets.
pub fn spawn_sweeper(state: AppState) {
    let interval = state.config.sweep_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick fires immediately; skip it
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match state.auth.sweep_expired_tokens().await {
                Ok(swept) if swept > 0 => {
                    tracing::info!(swept, "expired refresh tokens swept");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "token sweep failed"),
            }

            let pruned = state.google_limiter.prune_idle(LIMITER_IDLE_WINDOW).await;
            if pruned > 0 {
                tracing::debug!(pruned, "idle rate-limit buckets dropped");
            }
        }
    });
}

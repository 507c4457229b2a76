//! Vitta Auth API entry point

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use auth_api::config::Config;
use auth_api::state::{AppState, AuthServiceImpl};
use auth_api::{router, spawn_sweeper};
use vitta_db::pg::Repositories;
use vitta_db::{RefreshTokenRepository, UserRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Vitta Auth API");

    let config = Config::from_env()?;

    // Database and repositories
    let pool = vitta_db::create_pool(&config.database_url).await?;
    vitta_db::run_migrations(&pool).await?;
    let repos = Repositories::new(pool.clone());

    let users: Arc<dyn UserRepository> = Arc::new(repos.users);
    let refresh_tokens: Arc<dyn RefreshTokenRepository> = Arc::new(repos.refresh_tokens);
    let auth = AuthServiceImpl::new(config.auth.clone(), users, refresh_tokens);

    let state = AppState::new(auth, pool, config.clone());

    // Periodic hygiene: expired tokens and idle rate-limit buckets
    spawn_sweeper(state.clone());

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

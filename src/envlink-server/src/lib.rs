//! envlink server - HTTP API for provider login and the CLI token handoff.
//!
//! This crate provides:
//! - Browser-based identity-provider login, with or without a CLI attached
//! - The loopback-allow-listed CLI context binding and one-time exchange
//!   code handoff that lets a CLI retrieve the resulting credential
//! - A skeletal REST surface for the env-file sync endpoints

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use config::ServerConfig;
pub use error::{AppError, AppResult};
pub use state::AppState;

/// Run the server with the given configuration.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    run_with_shutdown(config, std::future::pending()).await
}

/// Run the server with graceful shutdown support.
pub async fn run_with_shutdown<F>(config: ServerConfig, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let state = Arc::new(AppState::new(config.clone())?);
    state.start_cleanup_task();

    let app = create_router_with_state(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    info!("Starting envlink server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shut down");
    Ok(())
}

/// Create the application router with an Arc-wrapped state.
pub fn create_router_with_state(state: Arc<AppState>) -> Router {
    let api_routes = auth::routes().merge(api::routes());

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

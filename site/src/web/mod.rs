//! Web server module
//!
//! Serves the webmention receiver and a small read-only JSON API.

pub mod api;
pub mod state;
pub mod webmention;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Start the web server on all interfaces
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Starting web server on http://localhost:{}", port);
    serve_on(listener, state).await
}

/// Serve on an already bound listener
pub async fn serve_on(listener: TcpListener, state: AppState) -> Result<()> {
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/interactions", get(api::list_interactions))
        .route("/health", get(api::health_check));

    Router::new()
        .route("/webmention", post(webmention::receive_webmention))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! HTTP surface: routes, sessions, and HTML views

pub mod routes;
pub mod sessions;
pub mod views;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use crate::app::AppState;

/// Serve requests on `bind_addr` until Ctrl+C
pub async fn serve(bind_addr: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, routes::build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

//! HTTP server for the console.

use crate::config::Config;
use crate::console::{ConsoleState, console_router};
use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Build the combined HTTP router.
pub fn http_router(state: Arc<ConsoleState>) -> Router {
    console_router(state)
}

/// Bind `listen_addr` and serve the console until the process exits.
pub async fn run_server(config: &Config, listen_addr: SocketAddr) -> Result<()> {
    let state = Arc::new(ConsoleState::from_config(config)?);
    info!(
        api = %state.clients.base_url(),
        placeholder_bearer = config.api.send_placeholder_bearer,
        "Backend API configured"
    );

    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("Failed to bind {listen_addr}"))?;
    serve(listener, state).await
}

/// Serve on an already bound listener.
pub async fn serve(listener: TcpListener, state: Arc<ConsoleState>) -> Result<()> {
    let local_addr = listener.local_addr().context("Listener has no local address")?;
    info!("Console listening on http://{}", local_addr);

    axum::serve(listener, http_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!("Cannot listen for shutdown signal: {}", e);
            std::future::pending::<()>().await
        }
    }
}

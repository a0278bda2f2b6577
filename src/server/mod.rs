//! HTTP API for push notifications
//!
//! # Endpoints
//!
//! - `POST /hook` - Receives push webhooks, always answers 200
//! - `GET /health` - Liveness probe
//! - `GET /` - Welcome text

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::git::BlobReader;
use crate::hook::HookController;
use crate::remote::RemoteExecutor;

/// Build the router for the webhook API
pub fn build_router<E, B>(controller: Arc<HookController<E, B>>) -> Router
where
    E: RemoteExecutor,
    B: BlobReader,
{
    Router::new()
        .route("/", get(home_page))
        .route("/health", get(health_check))
        // Push payloads grow with the number of commits, so /hook reads them whole
        .route("/hook", post(hook_handler::<E, B>).layer(DefaultBodyLimit::disable()))
        .with_state(controller)
}

/// Serve the webhook API on `addr` until Ctrl-C
pub async fn serve<E, B>(addr: SocketAddr, controller: Arc<HookController<E, B>>) -> Result<()>
where
    E: RemoteExecutor,
    B: BlobReader,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind webhook API to {addr}"))?;

    tracing::info!(%addr, "Starting hook api");

    axum::serve(listener, build_router(controller))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Webhook API server failed")?;

    tracing::info!("Hook api stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        // Without a signal handler, run until the process is killed
        std::future::pending::<()>().await;
    }
}

async fn home_page() -> &'static str {
    "Welcome to the pmg hook homepage! POST push webhooks to /hook."
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "pmg",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Webhook handler.
///
/// The deploy runs before the response is sent, but its outcome is never
/// reported back: every delivery is answered with 200.
async fn hook_handler<E, B>(State(controller): State<Arc<HookController<E, B>>>, body: Bytes) -> StatusCode
where
    E: RemoteExecutor,
    B: BlobReader,
{
    controller.handle_hook(&body).await;
    StatusCode::OK
}

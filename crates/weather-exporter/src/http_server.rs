//! HTTP exposition endpoint
//!
//! Serves the current gauge values for scraping. Read-only, no authentication.

use crate::metrics::MetricStore;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MetricStore>,
}

/// GET /metrics - Text exposition of all series
async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    match state.store.render() {
        Ok(body) => Ok((
            [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
            body,
        )),
        Err(e) => {
            log::error!("Failed to render metrics: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /health - Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

/// Create the HTTP router
pub fn create_router(store: Arc<MetricStore>) -> Router {
    let state = AppState { store };

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Bind the listening socket on all interfaces.
pub async fn bind(port: u16) -> std::io::Result<TcpListener> {
    TcpListener::bind(format!("0.0.0.0:{}", port)).await
}

/// Serve until `shutdown_rx` fires.
pub async fn serve(
    listener: TcpListener,
    store: Arc<MetricStore>,
    mut shutdown_rx: watch::Receiver<()>,
) -> std::io::Result<()> {
    let app = create_router(store);

    if let Ok(addr) = listener.local_addr() {
        log::info!("HTTP server listening on {}", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await
}

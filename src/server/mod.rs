// src/server/mod.rs
// =============================================================================
// The crawl service: an axum app exposing the crawler over HTTP.
//
// Routes:
// - POST /api/v1/crawl/  crawl a site, answer 200 / 207 / 400 / 422
// - GET  /health         liveness probe
//
// Every crawl request runs inside a tracing span with a fresh request id, and
// its latency is logged when the response goes out. /health is mounted after
// the trace layer so probes stay out of the logs.
//
// Rust concepts:
// - Router state: AppState is cloned into every handler
// - Layers: tower middleware wraps the routes registered before it
// - Graceful shutdown: serve until a future (Ctrl-C) completes
// =============================================================================

mod routes;

use anyhow::{Context, Result};
use axum::extract::Request;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::{info, Level};
use uuid::Uuid;

use crate::crawl::Crawler;

/// Shared application state: one crawler (and so one cache connection and
/// one HTTP client pool) for all requests.
#[derive(Clone)]
pub struct AppState {
    pub crawler: Crawler,
}

pub fn build_app(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                id = %Uuid::new_v4(),
                method = %request.method(),
                path = %request.uri().path(),
            )
        })
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    Router::new()
        .route("/api/v1/crawl/", post(routes::crawl_handler))
        .route("/api/v1/crawl", post(routes::crawl_handler))
        .layer(trace_layer)
        .route("/health", get(routes::health_handler))
        .with_state(state)
}

/// Serves the API on `bind` until Ctrl-C.
pub async fn serve(bind: SocketAddr, crawler: Crawler) -> Result<()> {
    info!(
        "Link cache TTL: {}s, scope: {:?}",
        crawler.options().cache_ttl.as_secs(),
        crawler.options().scope
    );
    let app = build_app(AppState { crawler });

    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("Starting crawl service on {}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Crawl service stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            // Without a signal handler, run until killed
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

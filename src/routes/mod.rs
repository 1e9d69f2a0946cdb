// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{Router, routing::get};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::{broadcast, watch};
use tower_http::cors::{Any, CorsLayer};

use crate::aggregator::Aggregator;
use crate::config::AppConfig;
use crate::models::StatusSnapshot;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) aggregator: Arc<Aggregator>,
    pub(crate) status_tx: broadcast::Sender<StatusSnapshot>,
    pub(crate) latest: watch::Receiver<Option<StatusSnapshot>>,
    pub(crate) ws_status_connections: Arc<AtomicUsize>,
    pub(crate) config: AppConfig,
}

pub fn app(
    aggregator: Arc<Aggregator>,
    status_tx: broadcast::Sender<StatusSnapshot>,
    latest: watch::Receiver<Option<StatusSnapshot>>,
    ws_status_connections: Arc<AtomicUsize>,
    config: AppConfig,
) -> Router {
    let state = AppState {
        aggregator,
        status_tx,
        latest,
        ws_status_connections,
        config,
    };
    Router::new()
        .route("/", get(|| async { "fleetstatus: recording fleet status" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/health", get(http::health_handler)) // GET /health
        .route(
            "/api/monitoring/unified-status",
            get(http::unified_status_handler),
        ) // GET /api/monitoring/unified-status
        .route("/api/monitoring/latest", get(http::latest_status_handler)) // GET /api/monitoring/latest
        .route("/ws/status", get(ws::ws_status)) // WS /ws/status
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

// GET handlers: version, health, unified status, latest polled status

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use super::AppState;
use crate::models::SubsystemKind;
use crate::version::{NAME, VERSION};

/// GET /version returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /health reports liveness of this service itself, not of the fleet.
pub(super) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let subsystems: Vec<&str> = SubsystemKind::ALL.iter().map(|k| k.as_str()).collect();
    axum::Json(serde_json::json!({
        "status": "ok",
        "service": NAME,
        "subsystems": subsystems,
        "deadlineMs": state.aggregator.deadline().as_millis() as u64,
        "pollIntervalMs": state.config.monitoring.poll_interval_ms,
    }))
}

/// GET /api/monitoring/unified-status runs a fresh aggregation (bounded by the deadline).
pub(super) async fn unified_status_handler(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(state.aggregator.status().await)
}

/// GET /api/monitoring/latest returns the last snapshot from the background poller.
pub(super) async fn latest_status_handler(
    State(state): State<AppState>,
) -> axum::response::Response {
    let latest = state.latest.borrow().clone();
    match latest {
        Some(snapshot) => axum::Json(snapshot).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            axum::Json(serde_json::json!({ "error": "no status polled yet" })),
        )
            .into_response(),
    }
}

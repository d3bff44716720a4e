//! Indexing status and rebuild routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::indexing::request_rebuild;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/index/status", get(get_index_status))
        .route("/index/warnings", get(get_index_warnings))
        .route("/index/rebuild", post(rebuild_index))
}

/// GET /api/index/status — worker state and last pass timing.
async fn get_index_status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let status = state.index_status.read().clone();
    let snapshot = state.snapshot();
    Json(serde_json::json!({
        "status": status,
        "indexedAt": snapshot.indexed_at,
        "origin": snapshot.origin,
        "elapsedMs": snapshot.elapsed_ms,
    }))
}

/// GET /api/index/warnings — per-document warnings from the last pass.
async fn get_index_warnings(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let snapshot = state.snapshot();
    Json(serde_json::json!({
        "total": snapshot.warnings.len(),
        "warnings": snapshot.warnings,
    }))
}

/// POST /api/index/rebuild — queue a full re-index.
async fn rebuild_index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if request_rebuild(&state, "requested via API") {
        (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "queued": true })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "Rebuild worker is not running" })),
        )
    }
}

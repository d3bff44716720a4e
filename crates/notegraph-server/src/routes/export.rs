//! Whole-graph JSON export.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;
use notegraph_store::GraphExport;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/export", get(get_export))
}

/// GET /api/export — documents, links, backlinks and unresolved targets.
async fn get_export(State(state): State<Arc<AppState>>) -> Json<GraphExport> {
    Json(state.snapshot().graph.export())
}

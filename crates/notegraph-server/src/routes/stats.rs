//! Stats route.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/stats", get(get_stats))
}

/// GET /api/stats — graph and indexing statistics.
async fn get_stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let snapshot = state.snapshot();
    let stats = snapshot.graph.stats();

    Json(serde_json::json!({
        "documents": stats.documents,
        "phantoms": stats.phantoms,
        "links": stats.links,
        "unresolvedLinks": stats.unresolved_links,
        "warnings": snapshot.warnings.len(),
        "filesScanned": snapshot.files_scanned,
        "elapsedMs": snapshot.elapsed_ms,
        "indexedAt": snapshot.indexed_at,
        "origin": snapshot.origin,
        "corpusDir": state.config.corpus_dir.display().to_string(),
    }))
}

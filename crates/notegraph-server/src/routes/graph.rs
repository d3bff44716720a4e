//! Graph query routes: documents, links, backlinks, unresolved targets.
//!
//! Ids contain `/`, so they travel as `?id=` rather than path segments.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use super::error_response;
use crate::state::AppState;
use notegraph_query::GraphQuery;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/documents", get(list_documents))
        .route("/document", get(get_document))
        .route("/links", get(get_links))
        .route("/backlinks", get(get_backlinks))
        .route("/unresolved", get(get_unresolved))
        .route("/orphans", get(get_orphans))
        .route("/tags/{tag}", get(get_tagged))
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: String,
}

/// GET /api/documents — every document in scan order.
async fn list_documents(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let snapshot = state.snapshot();
    let documents = GraphQuery::new(&snapshot.graph).documents();
    Json(serde_json::json!({
        "total": documents.len(),
        "documents": documents,
    }))
}

/// GET /api/document?id= — metadata, links and backlinks of one node.
async fn get_document(
    State(state): State<Arc<AppState>>,
    Query(q): Query<IdQuery>,
) -> impl IntoResponse {
    let snapshot = state.snapshot();
    match GraphQuery::new(&snapshot.graph).detail(&q.id) {
        Ok(detail) => (StatusCode::OK, Json(serde_json::json!(detail))),
        Err(e) => error_response(e),
    }
}

/// GET /api/links?id= — targets the document links to, in source order.
async fn get_links(
    State(state): State<Arc<AppState>>,
    Query(q): Query<IdQuery>,
) -> impl IntoResponse {
    let snapshot = state.snapshot();
    match GraphQuery::new(&snapshot.graph).links_from(&q.id) {
        Ok(links) => {
            let links: Vec<&str> = links.collect();
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "id": q.id,
                    "total": links.len(),
                    "links": links,
                })),
            )
        }
        Err(e) => error_response(e),
    }
}

/// GET /api/backlinks?id= — documents linking to the id.
async fn get_backlinks(
    State(state): State<Arc<AppState>>,
    Query(q): Query<IdQuery>,
) -> impl IntoResponse {
    let snapshot = state.snapshot();
    match GraphQuery::new(&snapshot.graph).backlinks_to(&q.id) {
        Ok(backlinks) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "id": q.id,
                "total": backlinks.len(),
                "backlinks": backlinks,
            })),
        ),
        Err(e) => error_response(e),
    }
}

/// GET /api/unresolved — dangling targets with the documents referencing them.
async fn get_unresolved(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let snapshot = state.snapshot();
    let query = GraphQuery::new(&snapshot.graph);
    let unresolved: Vec<serde_json::Value> = query
        .unresolved_links()
        .into_iter()
        .map(|target| {
            serde_json::json!({
                "target": target,
                "referrers": query.backlinks_to(target).unwrap_or_default(),
            })
        })
        .collect();
    Json(serde_json::json!({
        "total": unresolved.len(),
        "unresolved": unresolved,
    }))
}

/// GET /api/orphans — documents nothing else links to.
async fn get_orphans(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let snapshot = state.snapshot();
    let orphans = GraphQuery::new(&snapshot.graph).orphans();
    Json(serde_json::json!({
        "total": orphans.len(),
        "orphans": orphans,
    }))
}

/// GET /api/tags/{tag} — documents carrying a front-matter tag.
async fn get_tagged(
    State(state): State<Arc<AppState>>,
    Path(tag): Path<String>,
) -> Json<serde_json::Value> {
    let snapshot = state.snapshot();
    let documents = GraphQuery::new(&snapshot.graph).tagged(&tag);
    Json(serde_json::json!({
        "tag": tag,
        "total": documents.len(),
        "documents": documents,
    }))
}

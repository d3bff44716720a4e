//! Query result types.

use serde::Serialize;

use notegraph_store::Metadata;

/// One row of a document listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub id: String,
    pub path: String,
    pub title: String,
    pub tags: Vec<String>,
    pub links: usize,
    pub backlinks: usize,
}

/// A link as seen from its source document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkDetail {
    pub target: String,
    /// Node the target resolved to: a document id or the phantom key.
    pub resolved: String,
    pub unresolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    pub embed: bool,
    pub offset: usize,
}

/// Everything known about one graph node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDetail {
    pub id: String,
    /// A dangling link target with no backing document.
    pub phantom: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub metadata: Metadata,
    pub links: Vec<LinkDetail>,
    pub backlinks: Vec<String>,
}

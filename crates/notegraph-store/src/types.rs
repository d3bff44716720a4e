//! Data types for documents, links, and indexing warnings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Document identifier: relative path without extension, `/`-separated.
pub type DocumentId = String;

/// A front-matter value. Keys vary per document, so values stay dynamic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<String>),
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Scalars read as a one-element list, so `tags: stoicism` and
    /// `tags: [stoicism]` look the same to callers.
    pub fn to_list(&self) -> Vec<String> {
        match self {
            MetaValue::List(items) => items.clone(),
            other => vec![other.to_string()],
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Bool(b) => write!(f, "{}", b),
            MetaValue::Number(n) => write!(f, "{}", n),
            MetaValue::String(s) => f.write_str(s),
            MetaValue::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

/// Front-matter mapping. Ordered for deterministic exports.
pub type Metadata = BTreeMap<String, MetaValue>;

/// A note in the corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// Path relative to the corpus root.
    pub path: PathBuf,
    pub metadata: Metadata,
    pub body: String,
    /// SHA-256 of the decoded text with any byte-order mark removed, so a
    /// BOM alone does not change the hash.
    pub content_hash: String,
}

impl Document {
    /// `title` from front-matter, falling back to the last id segment.
    pub fn title(&self) -> &str {
        self.metadata
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or_else(|| self.id.rsplit('/').next().unwrap_or(&self.id))
    }

    /// `tags` from front-matter (scalar or list).
    pub fn tags(&self) -> Vec<String> {
        self.metadata
            .get("tags")
            .map(|v| v.to_list())
            .unwrap_or_default()
    }
}

/// One `[[wikilink]]` occurrence in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRef {
    /// Normalized target identifier (alias, anchor and `.md` stripped).
    pub target: String,
    /// Text between the brackets, verbatim.
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    /// `![[...]]` transclusion.
    #[serde(default)]
    pub embed: bool,
    /// Character offset of the opening bracket in the raw text.
    pub offset: usize,
}

/// Parser output for a single file.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub document: Document,
    /// Links in source order.
    pub links: Vec<LinkRef>,
    pub warnings: Vec<IndexWarning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    UnterminatedFrontMatter,
    MalformedFrontMatter,
    UnsupportedMetaValue,
    Unreadable,
    DuplicateId,
    AmbiguousLink,
}

/// A recoverable per-document problem found while indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexWarning {
    pub path: PathBuf,
    pub kind: WarningKind,
    pub message: String,
}

impl IndexWarning {
    pub fn new(path: impl Into<PathBuf>, kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for IndexWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Graph-level statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub documents: usize,
    pub phantoms: usize,
    pub links: usize,
    pub unresolved_links: usize,
}

//! Note graph backend using petgraph.
//!
//! Document nodes are inserted first, in scan order, so a document's
//! `NodeIndex` doubles as its scan position. Phantom nodes (dangling link
//! targets) follow as they are discovered. Every link occurrence is one edge.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// A node in the note graph: a document, or a phantom for a dangling target.
#[derive(Debug, Clone)]
pub struct NoteNode {
    pub key: String,
    document: Option<Document>,
    links: Vec<LinkRef>,
}

impl NoteNode {
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn is_phantom(&self) -> bool {
        self.document.is_none()
    }

    pub fn links(&self) -> &[LinkRef] {
        &self.links
    }
}

/// An edge: the `link`-th link of the source document.
#[derive(Debug, Clone, Copy)]
pub struct LinkEdge {
    pub link: usize,
}

/// How a link target matched the documents in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolution {
    Found(NodeIndex),
    /// Several documents matched by case or by stem; the first in scan order
    /// was taken.
    Ambiguous(NodeIndex, usize),
    Missing,
}

/// In-memory link graph built from parsed documents.
#[derive(Debug, Clone, Default)]
pub struct NoteGraph {
    graph: DiGraph<NoteNode, LinkEdge>,
    node_index: HashMap<String, NodeIndex>,
    lower_index: HashMap<String, NodeIndex>,
    /// Documents per lower-cased id; more than one means ids differ only in case.
    case_variants: HashMap<String, usize>,
    stem_index: HashMap<String, Vec<NodeIndex>>,
}

impl NoteGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_document(&mut self, document: Document, links: Vec<LinkRef>) -> NodeIndex {
        let key = document.id.clone();
        let lower = key.to_lowercase();
        let stem = lower.rsplit('/').next().unwrap_or(&lower).to_string();
        let idx = self.graph.add_node(NoteNode {
            key: key.clone(),
            document: Some(document),
            links,
        });
        self.node_index.insert(key, idx);
        *self.case_variants.entry(lower.clone()).or_default() += 1;
        self.lower_index.entry(lower).or_insert(idx);
        self.stem_index.entry(stem).or_default().push(idx);
        idx
    }

    /// Phantom for `target`, shared by every spelling that differs only in case.
    pub(crate) fn ensure_phantom(&mut self, target: &str) -> NodeIndex {
        let lower = target.to_lowercase();
        if let Some(&idx) = self.lower_index.get(&lower) {
            return idx;
        }
        let idx = self.graph.add_node(NoteNode {
            key: target.to_string(),
            document: None,
            links: Vec::new(),
        });
        self.node_index.insert(target.to_string(), idx);
        self.lower_index.insert(lower, idx);
        idx
    }

    pub(crate) fn add_link(&mut self, source: NodeIndex, target: NodeIndex, link: usize) {
        self.graph.add_edge(source, target, LinkEdge { link });
    }

    /// Resolve a target against documents only: exact id, case-insensitive id,
    /// then case-insensitive file stem.
    pub(crate) fn resolve_document(&self, target: &str) -> Resolution {
        if let Some(&idx) = self.node_index.get(target) {
            if !self.graph[idx].is_phantom() {
                return Resolution::Found(idx);
            }
        }
        let lower = target.to_lowercase();
        if let Some(&idx) = self.lower_index.get(&lower) {
            if !self.graph[idx].is_phantom() {
                return match self.case_variants.get(&lower) {
                    Some(&count) if count > 1 => Resolution::Ambiguous(idx, count),
                    _ => Resolution::Found(idx),
                };
            }
        }
        match self.stem_index.get(&lower).map(|v| v.as_slice()) {
            Some([only]) => Resolution::Found(*only),
            Some([first, rest @ ..]) => Resolution::Ambiguous(*first, rest.len() + 1),
            _ => Resolution::Missing,
        }
    }

    /// Find a node for a query identifier: a document id or a dangling target.
    pub fn lookup(&self, id: &str) -> Option<&NoteNode> {
        self.index_of(id).map(|idx| &self.graph[idx])
    }

    fn index_of(&self, id: &str) -> Option<NodeIndex> {
        if let Some(&idx) = self.node_index.get(id) {
            return Some(idx);
        }
        if let Some(&idx) = self.lower_index.get(&id.to_lowercase()) {
            return Some(idx);
        }
        match self.resolve_document(id) {
            Resolution::Found(idx) | Resolution::Ambiguous(idx, _) => Some(idx),
            Resolution::Missing => None,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.lookup(id).and_then(|n| n.document())
    }

    /// Documents in scan order.
    pub fn documents(&self) -> impl Iterator<Item = &Document> + '_ {
        self.graph.node_weights().filter_map(|n| n.document())
    }

    /// Phantom node keys in discovery order.
    pub fn phantoms(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph
            .node_weights()
            .filter(|n| n.is_phantom())
            .map(|n| n.key.as_str())
    }

    /// Keys of the nodes each link of `id` resolved to, in source order.
    pub fn resolved_targets(&self, id: &str) -> Option<Vec<&str>> {
        let idx = self.index_of(id)?;
        let mut edges: Vec<(usize, NodeIndex)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.weight().link, e.target()))
            .collect();
        edges.sort_by_key(|(link, _)| *link);
        Some(
            edges
                .into_iter()
                .map(|(_, t)| self.graph[t].key.as_str())
                .collect(),
        )
    }

    /// Documents linking to `id`, de-duplicated, in scan order.
    pub fn backlinks(&self, id: &str) -> Option<Vec<&str>> {
        let idx = self.index_of(id)?;
        Some(self.backlinks_of(idx))
    }

    fn backlinks_of(&self, idx: NodeIndex) -> Vec<&str> {
        let mut sources: Vec<NodeIndex> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| e.source())
            .collect();
        sources.sort();
        sources.dedup();
        sources
            .into_iter()
            .map(|s| self.graph[s].key.as_str())
            .collect()
    }

    /// Dangling targets that at least one document links to.
    pub fn unresolved(&self) -> BTreeSet<&str> {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph[idx].is_phantom())
            .filter(|&idx| {
                self.graph
                    .edges_directed(idx, Direction::Incoming)
                    .next()
                    .is_some()
            })
            .map(|idx| self.graph[idx].key.as_str())
            .collect()
    }

    /// Documents nothing links to (self-links do not count).
    pub fn orphans(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .filter(|&idx| !self.graph[idx].is_phantom())
            .filter(|&idx| {
                !self
                    .graph
                    .edges_directed(idx, Direction::Incoming)
                    .any(|e| e.source() != idx)
            })
            .map(|idx| self.graph[idx].key.as_str())
            .collect()
    }

    /// Get graph statistics.
    pub fn stats(&self) -> GraphStats {
        let phantoms = self.phantoms().count();
        let unresolved_links = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .filter(|(_, t)| self.graph[*t].is_phantom())
            .count();
        GraphStats {
            documents: self.graph.node_count() - phantoms,
            phantoms,
            links: self.graph.edge_count(),
            unresolved_links,
        }
    }

    /// Serializable snapshot of the whole graph.
    pub fn export(&self) -> GraphExport {
        let mut documents = Vec::new();
        let mut links = Vec::new();
        let mut backlinks = BTreeMap::new();

        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let sources = self.backlinks_of(idx);
            if !sources.is_empty() {
                backlinks.insert(
                    node.key.clone(),
                    sources.into_iter().map(String::from).collect(),
                );
            }

            let Some(doc) = node.document() else { continue };
            let resolved = self.resolved_targets(&node.key).unwrap_or_default();
            for (link, target) in node.links.iter().zip(resolved) {
                links.push(ExportedLink {
                    source: doc.id.clone(),
                    target: link.target.clone(),
                    resolved: target.to_string(),
                    offset: link.offset,
                    unresolved: self.graph[self.node_index[target]].is_phantom(),
                });
            }
            documents.push(ExportedDocument {
                id: doc.id.clone(),
                path: doc.path.to_string_lossy().replace('\\', "/"),
                title: doc.title().to_string(),
                metadata: doc.metadata.clone(),
                links: node.links.iter().map(|l| l.target.clone()).collect(),
                content_hash: doc.content_hash.clone(),
            });
        }

        GraphExport {
            documents,
            links,
            backlinks,
            unresolved: self.unresolved().into_iter().map(String::from).collect(),
        }
    }
}

/// JSON export of a graph. Equal exports mean equal graphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphExport {
    pub documents: Vec<ExportedDocument>,
    pub links: Vec<ExportedLink>,
    pub backlinks: BTreeMap<String, Vec<String>>,
    pub unresolved: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedDocument {
    pub id: String,
    pub path: String,
    pub title: String,
    pub metadata: Metadata,
    pub links: Vec<String>,
    pub content_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedLink {
    pub source: String,
    pub target: String,
    /// Node key the target resolved to (document id or phantom key).
    pub resolved: String,
    pub offset: usize,
    pub unresolved: bool,
}

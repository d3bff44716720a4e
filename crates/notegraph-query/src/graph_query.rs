//! Graph queries: forward links, backlinks, unresolved targets.

use std::collections::BTreeSet;
use std::slice;

use notegraph_core::{Error, Result};
use notegraph_store::{Document, GraphStats, LinkRef, NoteGraph, NoteNode};

use crate::types::*;

/// Read-only view over a graph. Cheap to construct; holds only a borrow.
#[derive(Debug, Clone, Copy)]
pub struct GraphQuery<'g> {
    graph: &'g NoteGraph,
}

/// Lazy sequence of the targets a document links to, in source order.
/// Clone it to restart from the beginning.
#[derive(Debug, Clone)]
pub struct LinksFrom<'g> {
    inner: slice::Iter<'g, LinkRef>,
}

impl<'g> Iterator for LinksFrom<'g> {
    type Item = &'g str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|l| l.target.as_str())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for LinksFrom<'_> {}

impl<'g> GraphQuery<'g> {
    pub fn new(graph: &'g NoteGraph) -> Self {
        Self { graph }
    }

    fn node(&self, id: &str) -> Result<&'g NoteNode> {
        self.graph
            .lookup(id)
            .ok_or_else(|| Error::NotFound(format!("document '{}'", id)))
    }

    /// Targets `id` links to, duplicates included. Empty for a dangling target.
    pub fn links_from(&self, id: &str) -> Result<LinksFrom<'g>> {
        let node = self.node(id)?;
        Ok(LinksFrom {
            inner: node.links().iter(),
        })
    }

    /// Documents that link to `id`, in scan order, each once.
    pub fn backlinks_to(&self, id: &str) -> Result<Vec<&'g str>> {
        self.graph
            .backlinks(id)
            .ok_or_else(|| Error::NotFound(format!("document '{}'", id)))
    }

    /// Dangling targets across the whole graph.
    pub fn unresolved_links(&self) -> BTreeSet<&'g str> {
        self.graph.unresolved()
    }

    pub fn document(&self, id: &str) -> Result<&'g Document> {
        self.node(id)?
            .document()
            .ok_or_else(|| Error::NotFound(format!("document '{}' (dangling link target)", id)))
    }

    /// All documents in scan order.
    pub fn documents(&self) -> Vec<DocumentSummary> {
        self.graph
            .documents()
            .map(|doc| DocumentSummary {
                id: doc.id.clone(),
                path: doc.path.to_string_lossy().replace('\\', "/"),
                title: doc.title().to_string(),
                tags: doc.tags(),
                links: self.graph.lookup(&doc.id).map(|n| n.links().len()).unwrap_or(0),
                backlinks: self.graph.backlinks(&doc.id).map(|b| b.len()).unwrap_or(0),
            })
            .collect()
    }

    /// Full view of a document or dangling target.
    pub fn detail(&self, id: &str) -> Result<NodeDetail> {
        let node = self.node(id)?;
        let resolved = self.graph.resolved_targets(&node.key).unwrap_or_default();
        let links = node
            .links()
            .iter()
            .zip(resolved)
            .map(|(link, target)| LinkDetail {
                target: link.target.clone(),
                resolved: target.to_string(),
                unresolved: self
                    .graph
                    .lookup(target)
                    .map(|n| n.is_phantom())
                    .unwrap_or(true),
                alias: link.alias.clone(),
                anchor: link.anchor.clone(),
                embed: link.embed,
                offset: link.offset,
            })
            .collect();

        let doc = node.document();
        Ok(NodeDetail {
            id: node.key.clone(),
            phantom: node.is_phantom(),
            path: doc.map(|d| d.path.to_string_lossy().replace('\\', "/")),
            title: doc.map(|d| d.title().to_string()),
            metadata: doc.map(|d| d.metadata.clone()).unwrap_or_default(),
            links,
            backlinks: self
                .backlinks_to(&node.key)?
                .into_iter()
                .map(String::from)
                .collect(),
        })
    }

    /// Documents with no incoming links from other documents.
    pub fn orphans(&self) -> Vec<&'g str> {
        self.graph.orphans()
    }

    /// Documents whose `tags` front-matter contains `tag` (case-insensitive,
    /// leading `#` ignored).
    pub fn tagged(&self, tag: &str) -> Vec<&'g str> {
        let wanted = tag.trim_start_matches('#').to_lowercase();
        self.graph
            .documents()
            .filter(|doc| {
                doc.tags()
                    .iter()
                    .any(|t| t.trim_start_matches('#').to_lowercase() == wanted)
            })
            .map(|doc| doc.id.as_str())
            .collect()
    }

    pub fn stats(&self) -> GraphStats {
        self.graph.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notegraph_ingest::index_sources;

    fn example() -> NoteGraph {
        index_sources(&[("A.md", "[[B]] and [[C]]"), ("B.md", "back to [[A]]")]).graph
    }

    #[test]
    fn test_example_queries() {
        let graph = example();
        let q = GraphQuery::new(&graph);

        assert_eq!(q.links_from("A").unwrap().collect::<Vec<_>>(), vec!["B", "C"]);
        assert_eq!(q.backlinks_to("A").unwrap(), vec!["B"]);
        assert_eq!(q.backlinks_to("B").unwrap(), vec!["A"]);
        assert_eq!(q.unresolved_links().into_iter().collect::<Vec<_>>(), vec!["C"]);
    }

    #[test]
    fn test_links_from_is_restartable() {
        let graph = example();
        let q = GraphQuery::new(&graph);
        let links = q.links_from("A").unwrap();
        assert_eq!(links.len(), 2);
        let again = links.clone();
        assert_eq!(links.collect::<Vec<_>>(), again.collect::<Vec<_>>());
        assert_eq!(q.links_from("A").unwrap().count(), 2);
    }

    #[test]
    fn test_dangling_target_is_not_an_error() {
        let graph = example();
        let q = GraphQuery::new(&graph);
        assert_eq!(q.links_from("C").unwrap().count(), 0);
        assert_eq!(q.backlinks_to("C").unwrap(), vec!["A"]);
        assert!(q.document("C").unwrap_err().is_not_found());

        let detail = q.detail("C").unwrap();
        assert!(detail.phantom);
        assert!(detail.path.is_none());
        assert_eq!(detail.backlinks, vec!["A"]);
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let graph = example();
        let q = GraphQuery::new(&graph);
        assert!(q.links_from("Z").unwrap_err().is_not_found());
        assert!(q.backlinks_to("Z").unwrap_err().is_not_found());
        assert!(q.detail("Z").unwrap_err().is_not_found());
    }

    #[test]
    fn test_unresolved_invariant() {
        let graph = index_sources(&[
            ("a.md", "[[b]] [[x]] [[y]]"),
            ("b.md", "[[x]] [[a]]"),
            ("c.md", "nothing"),
        ])
        .graph;
        let q = GraphQuery::new(&graph);
        for target in q.unresolved_links() {
            assert!(q.document(target).is_err());
            assert!(!q.backlinks_to(target).unwrap().is_empty());
            let referenced = graph
                .documents()
                .any(|d| q.links_from(&d.id).unwrap().any(|t| t == target));
            assert!(referenced);
        }
        assert_eq!(q.unresolved_links().len(), 2);
    }

    #[test]
    fn test_links_match_body_targets_in_order() {
        let graph = index_sources(&[(
            "n.md",
            "---\ntitle: N\n---\n[[one]] text [[two|2]] `[[skip]]` ![[three#h]] [[one]]",
        )])
        .graph;
        let q = GraphQuery::new(&graph);
        assert_eq!(
            q.links_from("n").unwrap().collect::<Vec<_>>(),
            vec!["one", "two", "three", "one"]
        );
    }

    #[test]
    fn test_detail_documents_orphans_and_tags() {
        let graph = index_sources(&[
            ("books/elbow.md", "---\ntitle: Elbow Room\ntags: [Free-Will, dennett]\n---\n[[freedom]] [[ghost|G]]"),
            ("books/freedom.md", "---\ntags: free-will\n---\n[[elbow]]"),
            ("lonely.md", "no links"),
        ])
        .graph;
        let q = GraphQuery::new(&graph);

        let detail = q.detail("books/elbow").unwrap();
        assert_eq!(detail.title.as_deref(), Some("Elbow Room"));
        assert_eq!(detail.links[0].resolved, "books/freedom");
        assert!(!detail.links[0].unresolved);
        assert!(detail.links[1].unresolved);
        assert_eq!(detail.links[1].alias.as_deref(), Some("G"));
        assert_eq!(detail.backlinks, vec!["books/freedom"]);

        let docs = q.documents();
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].id, "books/elbow");
        assert_eq!(docs[0].links, 2);
        assert_eq!(docs[0].backlinks, 1);

        assert_eq!(q.orphans(), vec!["lonely"]);
        assert_eq!(q.tagged("#free-will"), vec!["books/elbow", "books/freedom"]);
        assert_eq!(q.stats().phantoms, 1);
    }
}

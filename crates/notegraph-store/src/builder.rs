//! Graph builder: parsed documents → `NoteGraph`.

use tracing::{debug, warn};

use crate::graph::{NoteGraph, Resolution};
use crate::types::*;

/// Result of one build: the graph plus every warning collected on the way,
/// parser warnings included.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub graph: NoteGraph,
    pub warnings: Vec<IndexWarning>,
}

/// Assembles documents and links into a `NoteGraph`.
///
/// Building is a full rebuild; the builder holds no state between calls.
#[derive(Debug, Default)]
pub struct GraphBuilder;

impl GraphBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, mut parsed: Vec<ParsedDocument>) -> BuildOutput {
        parsed.sort_by(|a, b| a.document.path.cmp(&b.document.path));

        let mut graph = NoteGraph::new();
        let mut warnings = Vec::new();
        let mut sources = Vec::with_capacity(parsed.len());

        for doc in parsed {
            warnings.extend(doc.warnings);
            if graph.document(&doc.document.id).map(|d| d.id == doc.document.id) == Some(true) {
                let message = format!("duplicate document id '{}', skipped", doc.document.id);
                warn!("{}: {}", doc.document.path.display(), message);
                warnings.push(IndexWarning::new(
                    doc.document.path,
                    WarningKind::DuplicateId,
                    message,
                ));
                continue;
            }
            let targets: Vec<String> = doc.links.iter().map(|l| l.target.clone()).collect();
            let path = doc.document.path.clone();
            let idx = graph.add_document(doc.document, doc.links);
            sources.push((idx, path, targets));
        }

        for (source, path, targets) in sources {
            for (i, target) in targets.iter().enumerate() {
                let dest = match graph.resolve_document(target) {
                    Resolution::Found(idx) => idx,
                    Resolution::Ambiguous(idx, count) => {
                        let message = format!(
                            "link '{}' matches {} documents, using the first",
                            target, count
                        );
                        warn!("{}: {}", path.display(), message);
                        warnings.push(IndexWarning::new(
                            path.clone(),
                            WarningKind::AmbiguousLink,
                            message,
                        ));
                        idx
                    }
                    Resolution::Missing => {
                        debug!("{}: dangling link '{}'", path.display(), target);
                        graph.ensure_phantom(target)
                    }
                };
                graph.add_link(source, dest, i);
            }
        }

        BuildOutput { graph, warnings }
    }
}

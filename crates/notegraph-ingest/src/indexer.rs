//! Indexing pass: walk → parse in parallel → build the graph.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::corpus::walk_corpus;
use crate::file::read_note;
use crate::parser::parse_document;
use notegraph_core::{NoteGraphConfig, Result};
use notegraph_store::{GraphBuilder, IndexWarning, NoteGraph, ParsedDocument, WarningKind};

/// Everything one indexing pass produced.
#[derive(Debug, Clone)]
pub struct IndexOutcome {
    pub graph: NoteGraph,
    pub warnings: Vec<IndexWarning>,
    pub files_scanned: usize,
    pub elapsed_ms: u64,
}

/// Runs full indexing passes over a corpus directory.
#[derive(Debug, Clone)]
pub struct Indexer {
    root: PathBuf,
    extensions: Vec<String>,
}

impl Indexer {
    pub fn new(root: impl AsRef<Path>, extensions: Vec<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extensions,
        }
    }

    pub fn from_config(config: &NoteGraphConfig) -> Self {
        Self::new(&config.corpus_dir, config.extensions.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Index the whole corpus from scratch.
    ///
    /// Only a missing corpus root is an error; per-file problems become
    /// warnings and the pass continues.
    pub fn run(&self) -> Result<IndexOutcome> {
        let started = Instant::now();
        let files = walk_corpus(&self.root, &self.extensions)?;
        let files_scanned = files.len();

        let results: Vec<std::result::Result<ParsedDocument, IndexWarning>> =
            files.par_iter().map(|path| self.parse_file(path)).collect();

        let mut parsed = Vec::with_capacity(results.len());
        let mut unreadable = Vec::new();
        for result in results {
            match result {
                Ok(doc) => parsed.push(doc),
                Err(warning) => unreadable.push(warning),
            }
        }

        let output = GraphBuilder::new().build(parsed);
        let mut warnings = unreadable;
        warnings.extend(output.warnings);
        for w in &warnings {
            warn!("{}", w);
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let stats = output.graph.stats();
        info!(
            "Indexed {} files from {}: {} documents, {} links, {} unresolved targets, {} warnings in {}ms",
            files_scanned,
            self.root.display(),
            stats.documents,
            stats.links,
            stats.phantoms,
            warnings.len(),
            elapsed_ms
        );

        Ok(IndexOutcome {
            graph: output.graph,
            warnings,
            files_scanned,
            elapsed_ms,
        })
    }

    fn parse_file(&self, path: &Path) -> std::result::Result<ParsedDocument, IndexWarning> {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        match read_note(path) {
            Ok(raw) => {
                let parsed = parse_document(rel, &raw);
                debug!("Parsed {} ({} links)", rel.display(), parsed.links.len());
                Ok(parsed)
            }
            Err(e) => Err(IndexWarning::new(
                rel,
                WarningKind::Unreadable,
                format!("could not read file: {}", e),
            )),
        }
    }
}

/// Build a graph from in-memory `(relative path, text)` pairs.
pub fn index_sources<P: AsRef<Path> + Sync>(sources: &[(P, &str)]) -> IndexOutcome {
    let started = Instant::now();
    let parsed: Vec<ParsedDocument> = sources
        .par_iter()
        .map(|(path, raw)| parse_document(path.as_ref(), raw))
        .collect();
    let output = GraphBuilder::new().build(parsed);
    IndexOutcome {
        graph: output.graph,
        warnings: output.warnings,
        files_scanned: sources.len(),
        elapsed_ms: started.elapsed().as_millis() as u64,
    }
}

//! Shared application state.

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use notegraph_core::NoteGraphConfig;
use notegraph_store::{IndexWarning, NoteGraph, SnapshotStore};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// One complete indexing result. Replaced wholesale, never mutated.
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    pub graph: NoteGraph,
    pub warnings: Vec<IndexWarning>,
    /// RFC 3339 time the pass finished; `None` before the first pass.
    pub indexed_at: Option<String>,
    pub files_scanned: usize,
    pub elapsed_ms: u64,
    pub origin: SnapshotOrigin,
}

impl IndexSnapshot {
    pub fn empty() -> Self {
        Self {
            graph: NoteGraph::new(),
            warnings: Vec::new(),
            indexed_at: None,
            files_scanned: 0,
            elapsed_ms: 0,
            origin: SnapshotOrigin::Empty,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotOrigin {
    Empty,
    /// Loaded from the SQLite snapshot at startup.
    Stored,
    /// Produced by an indexing pass in this process.
    Live,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IndexState {
    Idle,
    Queued,
    Running,
    Failed,
}

/// Re-index bookkeeping exposed at `/api/index/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStatus {
    pub state: IndexState,
    pub runs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

/// A request to rebuild the graph from the corpus.
#[derive(Debug, Clone)]
pub struct RebuildRequest {
    pub reason: String,
}

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: NoteGraphConfig,
    pub store: SnapshotStore,
    snapshot: RwLock<Arc<IndexSnapshot>>,
    pub index_status: RwLock<IndexStatus>,
    pub rebuild_tx: mpsc::UnboundedSender<RebuildRequest>,
    /// Requests sent but not yet taken by the worker.
    pub(crate) pending_rebuilds: AtomicUsize,
    rebuild_rx: parking_lot::Mutex<Option<mpsc::UnboundedReceiver<RebuildRequest>>>,
}

impl AppState {
    /// Build state, serving the stored snapshot (if any) until the first pass.
    pub fn new(config: NoteGraphConfig, store: SnapshotStore) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let snapshot = match store.load() {
            Ok(Some(stored)) => {
                info!(
                    "Loaded stored snapshot: {} documents (indexed {})",
                    stored.graph.stats().documents,
                    stored.indexed_at.as_deref().unwrap_or("unknown")
                );
                IndexSnapshot {
                    graph: stored.graph,
                    warnings: stored.warnings,
                    indexed_at: stored.indexed_at,
                    files_scanned: 0,
                    elapsed_ms: 0,
                    origin: SnapshotOrigin::Stored,
                }
            }
            Ok(None) => IndexSnapshot::empty(),
            Err(e) => {
                warn!("Ignoring unreadable snapshot: {}", e);
                IndexSnapshot::empty()
            }
        };

        Self {
            config,
            store,
            snapshot: RwLock::new(Arc::new(snapshot)),
            index_status: RwLock::new(IndexStatus {
                state: IndexState::Idle,
                runs: 0,
                last_error: None,
                started_at: None,
                completed_at: None,
            }),
            rebuild_tx: tx,
            pending_rebuilds: AtomicUsize::new(0),
            rebuild_rx: parking_lot::Mutex::new(Some(rx)),
        }
    }

    /// The current snapshot. Handlers hold the `Arc`, so a concurrent
    /// rebuild never changes the graph under a request.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.snapshot.read().clone()
    }

    pub fn replace_snapshot(&self, snapshot: IndexSnapshot) {
        *self.snapshot.write() = Arc::new(snapshot);
    }

    /// Take the rebuild receiver (can only be called once, by the worker).
    pub fn take_rebuild_rx(&self) -> Option<mpsc::UnboundedReceiver<RebuildRequest>> {
        self.rebuild_rx.lock().take()
    }
}

//! Background re-indexing — rebuilds the graph off the request path.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::state::{AppState, IndexSnapshot, IndexState, RebuildRequest, SnapshotOrigin};
use notegraph_core::Result;
use notegraph_ingest::Indexer;

/// Run one full indexing pass, persist it, and publish it as the current
/// snapshot. Blocking; call from `spawn_blocking` inside the runtime.
pub fn run_index(state: &AppState) -> Result<Arc<IndexSnapshot>> {
    {
        let mut status = state.index_status.write();
        status.state = IndexState::Running;
        status.started_at = Some(now_millis());
    }

    let result = Indexer::from_config(&state.config).run();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            let mut status = state.index_status.write();
            status.state = if has_pending(state) {
                IndexState::Queued
            } else {
                IndexState::Failed
            };
            status.last_error = Some(e.to_string());
            status.completed_at = Some(now_millis());
            return Err(e);
        }
    };

    let indexed_at = chrono::Utc::now().to_rfc3339();
    if let Err(e) = state
        .store
        .save(&outcome.graph, &outcome.warnings, &indexed_at)
    {
        // The in-memory graph is still good; only persistence failed.
        error!("Failed to save snapshot: {}", e);
    }

    let snapshot = IndexSnapshot {
        graph: outcome.graph,
        warnings: outcome.warnings,
        indexed_at: Some(indexed_at),
        files_scanned: outcome.files_scanned,
        elapsed_ms: outcome.elapsed_ms,
        origin: SnapshotOrigin::Live,
    };
    state.replace_snapshot(snapshot);

    {
        let mut status = state.index_status.write();
        status.state = if has_pending(state) {
            IndexState::Queued
        } else {
            IndexState::Idle
        };
        status.runs += 1;
        status.last_error = None;
        status.completed_at = Some(now_millis());
    }

    Ok(state.snapshot())
}

/// Queue a rebuild. Returns `false` if the worker is gone.
///
/// The status lock is held across the send so a pass that finishes
/// concurrently sees the request as pending.
pub fn request_rebuild(state: &AppState, reason: &str) -> bool {
    let mut status = state.index_status.write();
    state.pending_rebuilds.fetch_add(1, Ordering::SeqCst);
    let sent = state
        .rebuild_tx
        .send(RebuildRequest {
            reason: reason.to_string(),
        })
        .is_ok();
    if !sent {
        state.pending_rebuilds.fetch_sub(1, Ordering::SeqCst);
        return false;
    }
    if status.state != IndexState::Running {
        status.state = IndexState::Queued;
    }
    true
}

/// Take every request already queued behind the one just received.
/// Returns how many were merged.
pub(crate) fn drain_queued(
    state: &AppState,
    rx: &mut mpsc::UnboundedReceiver<RebuildRequest>,
) -> usize {
    let mut merged = 0;
    while rx.try_recv().is_ok() {
        merged += 1;
    }
    state.pending_rebuilds.fetch_sub(merged, Ordering::SeqCst);
    merged
}

fn has_pending(state: &AppState) -> bool {
    state.pending_rebuilds.load(Ordering::SeqCst) > 0
}

/// Start the background rebuild worker task.
pub fn start_rebuild_worker(state: Arc<AppState>) {
    let mut rx = match state.take_rebuild_rx() {
        Some(rx) => rx,
        None => {
            error!("Rebuild worker already started");
            return;
        }
    };

    tokio::spawn(async move {
        info!("Background rebuild worker started");
        while let Some(request) = rx.recv().await {
            state.pending_rebuilds.fetch_sub(1, Ordering::SeqCst);
            // Requests queued while we were busy collapse into this pass.
            let merged = drain_queued(&state, &mut rx);
            info!(
                "Rebuilding graph ({}; {} queued requests merged)",
                request.reason, merged
            );

            let worker_state = state.clone();
            match tokio::task::spawn_blocking(move || run_index(&worker_state)).await {
                Ok(Ok(snapshot)) => info!(
                    "Rebuild complete: {} documents in {}ms",
                    snapshot.graph.stats().documents,
                    snapshot.elapsed_ms
                ),
                Ok(Err(e)) => error!("Rebuild failed: {}", e),
                Err(e) => error!("Rebuild task panicked: {}", e),
            }
        }
    });
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notegraph_core::NoteGraphConfig;
    use notegraph_store::SnapshotStore;

    fn state_for(corpus: &std::path::Path, data: &std::path::Path) -> AppState {
        std::fs::write(corpus.join("A.md"), "[[B]]").unwrap();
        let config = NoteGraphConfig::new(corpus, data).unwrap();
        let store = SnapshotStore::open(&config.data_paths.snapshot_db).unwrap();
        AppState::new(config, store)
    }

    fn current(state: &AppState) -> IndexState {
        state.index_status.read().state
    }

    #[test]
    fn test_request_during_running_pass_stays_queued() {
        let corpus = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        let state = state_for(corpus.path(), data.path());
        let mut rx = state.take_rebuild_rx().unwrap();

        assert!(request_rebuild(&state, "first"));
        assert_eq!(current(&state), IndexState::Queued);

        // The worker picks the first request up and starts a pass.
        rx.try_recv().unwrap();
        state.pending_rebuilds.fetch_sub(1, Ordering::SeqCst);
        state.index_status.write().state = IndexState::Running;

        assert!(request_rebuild(&state, "second"));
        assert_eq!(current(&state), IndexState::Running);

        run_index(&state).unwrap();
        assert_eq!(current(&state), IndexState::Queued);

        assert_eq!(drain_queued(&state, &mut rx), 1);
        run_index(&state).unwrap();
        assert_eq!(current(&state), IndexState::Idle);
        assert_eq!(state.index_status.read().runs, 2);
    }

    #[test]
    fn test_failed_send_is_not_reported_as_queued() {
        let corpus = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        let state = state_for(corpus.path(), data.path());
        drop(state.take_rebuild_rx());

        assert!(!request_rebuild(&state, "orphaned"));
        assert_eq!(current(&state), IndexState::Idle);
        run_index(&state).unwrap();
        assert_eq!(current(&state), IndexState::Idle);
    }
}

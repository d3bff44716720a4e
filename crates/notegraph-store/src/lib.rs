//! NoteGraph Store — document/link model, petgraph link graph, SQLite snapshots.

pub mod builder;
pub mod graph;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use builder::{BuildOutput, GraphBuilder};
pub use graph::{ExportedDocument, ExportedLink, GraphExport, NoteGraph, NoteNode};
pub use sqlite::{SnapshotStore, StoredSnapshot};
pub use types::*;

//! Query layer — read-only questions over a built `NoteGraph`.
//!
//! Unknown identifiers fail with `Error::NotFound`; dangling link targets are
//! valid identifiers and answer like any other node.

pub mod graph_query;
pub mod types;

pub use graph_query::{GraphQuery, LinksFrom};
pub use types::*;

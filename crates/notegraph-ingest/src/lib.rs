//! NoteGraph Ingest — front-matter and wikilink parsing, corpus walk, indexing pass.

pub mod corpus;
pub mod file;
pub mod frontmatter;
pub mod indexer;
pub mod links;
pub mod parser;

pub use corpus::walk_corpus;
pub use indexer::{index_sources, IndexOutcome, Indexer};
pub use parser::{document_id, parse_document};

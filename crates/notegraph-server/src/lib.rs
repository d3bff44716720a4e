//! NoteGraph server — HTTP query API and background re-indexing.

pub mod indexing;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;

//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File extensions indexed when `NOTEGRAPH_EXTENSIONS` is not set.
pub const DEFAULT_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3004;

/// Paths to all NoteGraph data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// SQLite snapshot of the last indexing pass (`data/notegraph.db`).
    pub snapshot_db: PathBuf,
    /// JSON graph exports (`data/exports/`).
    pub exports: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            snapshot_db: root.join("notegraph.db"),
            exports: root.join("exports"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(&self.exports)?;
        Ok(())
    }
}

/// Top-level NoteGraph configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteGraphConfig {
    /// HTTP server port.
    pub port: u16,
    /// Root of the note corpus.
    pub corpus_dir: PathBuf,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Lower-case file extensions (without the dot) that count as notes.
    pub extensions: Vec<String>,
}

impl NoteGraphConfig {
    /// Build a configuration with default port and extensions.
    pub fn new(corpus_dir: impl AsRef<Path>, data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self {
            port: DEFAULT_PORT,
            corpus_dir: corpus_dir.as_ref().to_path_buf(),
            data_paths: DataPaths::new(data_dir)?,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        })
    }

    /// Create configuration from environment and defaults.
    ///
    /// `corpus_dir` wins over `NOTEGRAPH_CORPUS_DIR` when given.
    pub fn from_env(corpus_dir: Option<PathBuf>) -> std::io::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let corpus_dir = corpus_dir.unwrap_or_else(|| {
            std::env::var("NOTEGRAPH_CORPUS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("notes"))
        });

        let data_dir = std::env::var("NOTEGRAPH_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let mut config = Self::new(corpus_dir, data_dir)?;
        config.port = port;

        if let Ok(raw) = std::env::var("NOTEGRAPH_EXTENSIONS") {
            let extensions = parse_extensions(&raw);
            if extensions.is_empty() {
                tracing::warn!("NOTEGRAPH_EXTENSIONS is empty, keeping defaults");
            } else {
                config.extensions = extensions;
            }
        }

        Ok(config)
    }
}

/// Parse a comma-separated extension list: `".md, TXT"` → `["md", "txt"]`.
pub fn parse_extensions(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let ext = part.trim().trim_start_matches('.').to_lowercase();
        if !ext.is_empty() && !out.contains(&ext) {
            out.push(ext);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extensions() {
        assert_eq!(parse_extensions(".md, TXT,,md"), vec!["md", "txt"]);
        assert!(parse_extensions(" , ").is_empty());
    }

    #[test]
    fn test_data_paths_created() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path().join("data")).unwrap();
        assert!(paths.exports.is_dir());
        assert_eq!(paths.snapshot_db, dir.path().join("data").join("notegraph.db"));
    }
}

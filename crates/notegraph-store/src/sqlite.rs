//! SQLite persistence for index snapshots.
//!
//! Each indexing pass replaces the whole snapshot in one transaction. Loading
//! re-runs the graph builder over the stored documents, so a loaded graph is
//! identical to the one that was saved.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::builder::GraphBuilder;
use crate::graph::NoteGraph;
use crate::schema::SCHEMA_SQL;
use crate::types::*;
use notegraph_core::{Error, Result};

/// A snapshot read back from disk.
#[derive(Debug, Clone)]
pub struct StoredSnapshot {
    pub graph: NoteGraph,
    pub warnings: Vec<IndexWarning>,
    pub indexed_at: Option<String>,
}

/// SQLite store holding the most recent index snapshot.
pub struct SnapshotStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SnapshotStore {
    /// Open or create the snapshot database at `db_path`.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Self::create_connection(&db_path)?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };
        info!(
            "SnapshotStore opened: {} documents, path={}",
            store.count_documents()?,
            store.db_path.display()
        );
        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(conn)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn count_documents(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Replace the stored snapshot with `graph` and `warnings`.
    pub fn save(&self, graph: &NoteGraph, warnings: &[IndexWarning], indexed_at: &str) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(e.to_string()))?;

        tx.execute_batch("DELETE FROM links; DELETE FROM documents; DELETE FROM snapshot_info;")
            .map_err(|e| Error::Database(e.to_string()))?;

        {
            let mut insert_doc = tx
                .prepare(
                    "INSERT INTO documents (id, path, position, metadata_json, body, content_hash)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )
                .map_err(|e| Error::Database(e.to_string()))?;
            let mut insert_link = tx
                .prepare(
                    "INSERT INTO links (source, position, target, raw, alias, anchor, embed, char_offset)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )
                .map_err(|e| Error::Database(e.to_string()))?;

            for (position, doc) in graph.documents().enumerate() {
                let metadata_json = serde_json::to_string(&doc.metadata)?;
                insert_doc
                    .execute(params![
                        doc.id,
                        doc.path.to_string_lossy().replace('\\', "/"),
                        position as i64,
                        metadata_json,
                        doc.body,
                        doc.content_hash,
                    ])
                    .map_err(|e| Error::Database(e.to_string()))?;

                let links = graph.lookup(&doc.id).map(|n| n.links()).unwrap_or_default();
                for (i, link) in links.iter().enumerate() {
                    insert_link
                        .execute(params![
                            doc.id,
                            i as i64,
                            link.target,
                            link.raw,
                            link.alias,
                            link.anchor,
                            link.embed,
                            link.offset as i64,
                        ])
                        .map_err(|e| Error::Database(e.to_string()))?;
                }
            }
        }

        let warnings_json = serde_json::to_string(warnings)?;
        tx.execute(
            "INSERT INTO snapshot_info (key, value) VALUES ('indexed_at', ?1), ('warnings', ?2)",
            params![indexed_at, warnings_json],
        )
        .map_err(|e| Error::Database(e.to_string()))?;

        tx.commit().map_err(|e| Error::Database(e.to_string()))?;
        debug!("Saved snapshot of {} documents", graph.stats().documents);
        Ok(())
    }

    /// Load the stored snapshot. `None` when nothing was ever saved.
    pub fn load(&self) -> Result<Option<StoredSnapshot>> {
        let conn = self.conn.lock();

        let indexed_at: Option<String> = conn
            .query_row(
                "SELECT value FROM snapshot_info WHERE key = 'indexed_at'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        let Some(indexed_at) = indexed_at else {
            return Ok(None);
        };

        let warnings: Vec<IndexWarning> = conn
            .query_row(
                "SELECT value FROM snapshot_info WHERE key = 'warnings'",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?
            .map(|raw| serde_json::from_str(&raw))
            .transpose()?
            .unwrap_or_default();

        let mut doc_stmt = conn
            .prepare(
                "SELECT id, path, metadata_json, body, content_hash FROM documents ORDER BY position",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = doc_stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut link_stmt = conn
            .prepare(
                "SELECT target, raw, alias, anchor, embed, char_offset FROM links
                 WHERE source = ?1 ORDER BY position",
            )
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut parsed = Vec::new();
        for row in rows {
            let (id, path, metadata_json, body, content_hash) =
                row.map_err(|e| Error::Database(e.to_string()))?;
            let links = link_stmt
                .query_map(params![id], |row| {
                    Ok(LinkRef {
                        target: row.get(0)?,
                        raw: row.get(1)?,
                        alias: row.get(2)?,
                        anchor: row.get(3)?,
                        embed: row.get(4)?,
                        offset: row.get::<_, i64>(5)? as usize,
                    })
                })
                .map_err(|e| Error::Database(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::Database(e.to_string()))?;

            parsed.push(ParsedDocument {
                document: Document {
                    id,
                    path: PathBuf::from(path),
                    metadata: serde_json::from_str(&metadata_json)?,
                    body,
                    content_hash,
                },
                links,
                warnings: Vec::new(),
            });
        }

        let graph = GraphBuilder::new().build(parsed).graph;
        Ok(Some(StoredSnapshot {
            graph,
            warnings,
            indexed_at: Some(indexed_at),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (SnapshotStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::open(dir.path().join("notegraph.db")).unwrap();
        (store, dir)
    }

    fn parsed(id: &str, targets: &[&str]) -> ParsedDocument {
        let mut metadata = Metadata::new();
        metadata.insert("year".into(), MetaValue::Number(1984.0));
        metadata.insert("tags".into(), MetaValue::List(vec!["free-will".into()]));
        ParsedDocument {
            document: Document {
                id: id.into(),
                path: PathBuf::from(format!("{}.md", id)),
                metadata,
                body: format!("body of {}", id),
                content_hash: format!("hash-{}", id),
            },
            links: targets
                .iter()
                .enumerate()
                .map(|(i, t)| LinkRef {
                    target: t.to_string(),
                    raw: format!("{}|alias", t),
                    alias: Some("alias".into()),
                    anchor: None,
                    embed: i % 2 == 1,
                    offset: i * 7,
                })
                .collect(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_load_empty_store() {
        let (store, _dir) = test_store();
        assert!(store.load().unwrap().is_none());
        assert_eq!(store.count_documents().unwrap(), 0);
    }

    #[test]
    fn test_save_and_load_preserves_graph() {
        let (store, _dir) = test_store();
        let graph = GraphBuilder::new()
            .build(vec![parsed("a", &["b", "ghost"]), parsed("b", &["a"])])
            .graph;
        let warnings = vec![IndexWarning::new(
            "c.md",
            WarningKind::UnterminatedFrontMatter,
            "front-matter block is never closed",
        )];

        store.save(&graph, &warnings, "2026-01-01T00:00:00Z").unwrap();
        let loaded = store.load().unwrap().unwrap();

        assert_eq!(loaded.graph.export(), graph.export());
        assert_eq!(loaded.warnings, warnings);
        assert_eq!(loaded.indexed_at.as_deref(), Some("2026-01-01T00:00:00Z"));
        assert_eq!(loaded.graph.document("a").unwrap().body, "body of a");
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let (store, _dir) = test_store();
        let first = GraphBuilder::new()
            .build(vec![parsed("a", &[]), parsed("b", &[])])
            .graph;
        store.save(&first, &[], "t1").unwrap();

        let second = GraphBuilder::new().build(vec![parsed("c", &["a"])]).graph;
        store.save(&second, &[], "t2").unwrap();

        assert_eq!(store.count_documents().unwrap(), 1);
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.graph.export().unresolved, vec!["a"]);
    }
}

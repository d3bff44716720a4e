//! Database schema SQL for index snapshots.

/// Snapshot tables: documents, links, key/value snapshot info.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    path TEXT NOT NULL,
    position INTEGER NOT NULL,
    metadata_json TEXT NOT NULL,
    body TEXT NOT NULL,
    content_hash TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS links (
    source TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    target TEXT NOT NULL,
    raw TEXT NOT NULL,
    alias TEXT,
    anchor TEXT,
    embed INTEGER NOT NULL DEFAULT 0,
    char_offset INTEGER NOT NULL,
    PRIMARY KEY (source, position)
);

CREATE INDEX IF NOT EXISTS idx_links_target ON links(target);

CREATE TABLE IF NOT EXISTS snapshot_info (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

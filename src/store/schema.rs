//! SQLite DDL for the trend store.
//!
//! All `CREATE TABLE` / `CREATE INDEX` statements live here so they are
//! reviewable and testable in isolation.

use rusqlite::Connection;

/// Complete DDL for the trend database.
///
/// Uses `IF NOT EXISTS` throughout so `apply_schema` is idempotent.
pub(crate) const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Tracked entities (a site, a brand, a venue category).
CREATE TABLE IF NOT EXISTS entities (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT NOT NULL,
    kind       TEXT NOT NULL,      -- e.g. restaurant, onsen, brand
    created_at TEXT NOT NULL,      -- RFC 3339, UTC
    updated_at TEXT NOT NULL,
    UNIQUE (name, kind)
);

-- Topics searched on behalf of an entity.
CREATE TABLE IF NOT EXISTS entity_topics (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_id  INTEGER NOT NULL REFERENCES entities(id),
    topic      TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (entity_id, topic)
);

CREATE INDEX IF NOT EXISTS idx_entity_topics_entity ON entity_topics(entity_id);

-- One scored observation per topic, day and top name.
CREATE TABLE IF NOT EXISTS topic_trends (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    topic_id   INTEGER NOT NULL REFERENCES entity_topics(id),
    period     TEXT NOT NULL,      -- YYYY-MM-DD, UTC
    score      REAL NOT NULL,
    top_name   TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (topic_id, period, top_name)
);

CREATE INDEX IF NOT EXISTS idx_topic_trends_topic ON topic_trends(topic_id);
"#;

/// Apply the full schema to an open connection.
///
/// Safe to call multiple times.
pub(crate) fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

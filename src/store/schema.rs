//! SQLite DDL definitions for the message store.
//!
//! All `CREATE TABLE` / `CREATE INDEX` statements live here so they are
//! reviewable and testable in isolation. Version 1 created the `messages`
//! table with the timestamp index; version 2 adds the derivation
//! back-reference index. Upgrades are additive and in place — no data is
//! rewritten.

use rusqlite::Connection;

/// Schema version written by the current code.
pub(crate) const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Version 1 DDL: the base tables and the timestamp index.
///
/// Uses `IF NOT EXISTS` throughout so schema application is idempotent.
const SCHEMA_V1_SQL: &str = r#"
-- Enable WAL mode for concurrent reads during writes.
PRAGMA journal_mode = WAL;

-- Schema version tracking.
CREATE TABLE IF NOT EXISTS schema_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Chat messages — mirrors ChatMessage fields.
CREATE TABLE IF NOT EXISTS messages (
    id        TEXT PRIMARY KEY,
    role      TEXT NOT NULL,       -- 'user' | 'assistant'
    content   TEXT NOT NULL,
    timestamp INTEGER NOT NULL,    -- epoch milliseconds
    detected  TEXT,                -- JSON {"language","confidence"}
    origin_id TEXT                 -- derivation back-reference
);

-- Chronological retrieval.
CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages(timestamp);
"#;

/// Version 2 addition: secondary index on the derivation back-reference.
const ORIGIN_INDEX_SQL: &str =
    "CREATE INDEX IF NOT EXISTS idx_messages_origin_id ON messages(origin_id)";

/// Apply the schema to an open connection, upgrading older databases.
///
/// Safe to call multiple times. A fresh database is seeded at version 1
/// and immediately upgraded to the current version; an existing v1
/// database gets the missing index without data loss.
pub(crate) fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_V1_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;
    upgrade_if_needed(conn)
}

/// Run any pending additive upgrades.
fn upgrade_if_needed(conn: &Connection) -> rusqlite::Result<()> {
    let current = read_schema_version(conn)?.unwrap_or(1);
    if current < 2 {
        conn.execute(ORIGIN_INDEX_SQL, [])?;
        write_schema_version(conn, 2)?;
    }
    Ok(())
}

/// Read the current schema version from the database.
pub(crate) fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<u32>> {
    let mut stmt = conn.prepare("SELECT value FROM schema_meta WHERE key = 'schema_version'")?;
    let mut rows = stmt.query([])?;
    match rows.next()? {
        Some(row) => {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().ok())
        }
        None => Ok(None),
    }
}

fn write_schema_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE schema_meta SET value = ?1 WHERE key = 'schema_version'",
        rusqlite::params![version.to_string()],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn index_names(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type='index' ORDER BY name")
            .expect("prepare")
            .query_map([], |row| row.get(0))
            .expect("query")
            .filter_map(|r| r.ok())
            .collect()
    }

    #[test]
    fn apply_schema_creates_tables_and_indexes() {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        apply_schema(&conn).expect("apply_schema");

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .expect("prepare")
            .query_map([], |row| row.get(0))
            .expect("query")
            .filter_map(|r| r.ok())
            .collect();
        assert!(tables.contains(&"messages".to_owned()));
        assert!(tables.contains(&"schema_meta".to_owned()));

        let indexes = index_names(&conn);
        assert!(indexes.contains(&"idx_messages_timestamp".to_owned()));
        assert!(indexes.contains(&"idx_messages_origin_id".to_owned()));
    }

    #[test]
    fn apply_schema_is_idempotent() {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        apply_schema(&conn).expect("first apply");
        apply_schema(&conn).expect("second apply (idempotent)");
        assert_eq!(
            read_schema_version(&conn).expect("read"),
            Some(CURRENT_SCHEMA_VERSION)
        );
    }

    #[test]
    fn v1_database_upgrades_in_place_without_data_loss() {
        let conn = Connection::open_in_memory().expect("open in-memory db");

        // Simulate a database created by version 1 of the schema.
        conn.execute_batch(SCHEMA_V1_SQL).expect("v1 ddl");
        conn.execute(
            "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
            [],
        )
        .expect("seed version");
        conn.execute(
            "INSERT INTO messages (id, role, content, timestamp) VALUES ('m1', 'user', 'hi', 42)",
            [],
        )
        .expect("insert row");
        assert!(!index_names(&conn).contains(&"idx_messages_origin_id".to_owned()));

        // Re-opening applies the upgrade.
        apply_schema(&conn).expect("upgrade");
        assert_eq!(read_schema_version(&conn).expect("read"), Some(2));
        assert!(index_names(&conn).contains(&"idx_messages_origin_id".to_owned()));

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 1);
    }
}

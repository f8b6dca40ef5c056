//! Database schema definitions and migration logic for the SQLite store.

use rusqlite::{Connection, Result};

pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the issue store database.
pub const SCHEMA_SQL: &str = r"
    -- Canonical issue records, stored as the remote JSON shape.
    CREATE TABLE IF NOT EXISTS issues (
        id TEXT PRIMARY KEY,
        record TEXT NOT NULL,
        status_flags INTEGER NOT NULL DEFAULT 1,
        updated_at TEXT NOT NULL
    );

    -- Per-query id sets: current matches and archived matches.
    CREATE TABLE IF NOT EXISTS query_ids (
        query_name TEXT NOT NULL,
        issue_id TEXT NOT NULL,
        archived INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (query_name, issue_id, archived)
    );
    CREATE INDEX IF NOT EXISTS idx_query_ids_name ON query_ids(query_name, archived);
";

/// Apply the schema to a connection, stamping the user version.
///
/// # Errors
///
/// Returns an error when the schema SQL cannot be executed.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version < CURRENT_SCHEMA_VERSION {
        conn.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)?;
    }
    Ok(())
}

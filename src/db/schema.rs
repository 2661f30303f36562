//! SQL DDL for the metadata store.
//!
//! Defines the `build_meta`, `stale_nodes`, and `schema_meta` tables. All DDL uses
//! `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

/// Version-1 schema. Later columns are added by [`super::migrations`].
const SCHEMA_SQL: &str = r#"
-- Last successful build and other graph-level facts
CREATE TABLE IF NOT EXISTS build_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Vault-relative paths changed since the last successful build
CREATE TABLE IF NOT EXISTS stale_nodes (
    path TEXT PRIMARY KEY,
    marked_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_stale_marked_at ON stale_nodes(marked_at);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}

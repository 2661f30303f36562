//! Metadata store: stale-path tracking and build bookkeeping.
//!
//! A path is stale when its document changed after the last successful build.
//! Recording a build clears, in the same transaction, the marks written before
//! that build started. Marks that arrive while it runs survive it.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;

use crate::error::IndexResult;

const LAST_BUILT_AT: &str = "last_built_at";
const LAST_NODE_COUNT: &str = "last_node_count";

/// Fixed-width UTC form so `marked_at` compares correctly as text.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Mark a vault-relative path stale. Re-marking refreshes the timestamp.
///
/// `source` names whatever reported the change (a tool name, `"cli"`).
pub fn mark_stale(conn: &Connection, path: &str, source: Option<&str>) -> IndexResult<()> {
    conn.execute(
        "INSERT INTO stale_nodes (path, marked_at, source) VALUES (?1, ?2, ?3)
         ON CONFLICT(path) DO UPDATE SET marked_at = excluded.marked_at, source = excluded.source",
        params![path, timestamp(Utc::now()), source],
    )?;
    tracing::debug!(path, source = source.unwrap_or("-"), "marked stale");
    Ok(())
}

pub fn load_stale_nodes(conn: &Connection) -> IndexResult<BTreeSet<String>> {
    let mut stmt = conn.prepare("SELECT path FROM stale_nodes")?;
    let paths = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<BTreeSet<_>>>()?;
    Ok(paths)
}

pub fn stale_count(conn: &Connection) -> IndexResult<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM stale_nodes", [], |row| row.get(0))?;
    Ok(count.max(0) as usize)
}

/// Remove every stale mark. Returns how many were removed.
pub fn clear_stale(conn: &Connection) -> IndexResult<usize> {
    Ok(conn.execute("DELETE FROM stale_nodes", [])?)
}

/// Store the build timestamp and node count, and clear the stale marks the
/// build covered, atomically.
///
/// `started_at` is when the build began reading the vault. Marks written at or
/// before it are cleared; later ones describe edits the build may have missed.
pub fn record_build(
    conn: &mut Connection,
    started_at: DateTime<Utc>,
    built_at: DateTime<Utc>,
    node_count: usize,
) -> IndexResult<()> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT OR REPLACE INTO build_meta (key, value) VALUES (?1, ?2)",
        params![LAST_BUILT_AT, built_at.to_rfc3339()],
    )?;
    tx.execute(
        "INSERT OR REPLACE INTO build_meta (key, value) VALUES (?1, ?2)",
        params![LAST_NODE_COUNT, node_count.to_string()],
    )?;
    let cleared = tx.execute(
        "DELETE FROM stale_nodes WHERE marked_at <= ?1",
        params![timestamp(started_at)],
    )?;
    tx.commit()?;

    tracing::info!(node_count, cleared, built_at = %built_at.to_rfc3339(), "build recorded");
    Ok(())
}

/// Timestamp of the last recorded build, if any. An unparseable stored value
/// reads as `None`.
pub fn last_built_at(conn: &Connection) -> IndexResult<Option<DateTime<Utc>>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM build_meta WHERE key = ?1",
            params![LAST_BUILT_AT],
            |row| row.get(0),
        )
        .optional()?;

    Ok(raw.and_then(|s| match DateTime::parse_from_rfc3339(&s) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            tracing::warn!(value = %s, error = %e, "ignoring malformed last_built_at");
            None
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    #[test]
    fn mark_is_idempotent_per_path() {
        let conn = open_memory_database().unwrap();
        mark_stale(&conn, "a.md", Some("Write")).unwrap();
        mark_stale(&conn, "a.md", Some("Edit")).unwrap();
        mark_stale(&conn, "b.md", None).unwrap();

        let stale = load_stale_nodes(&conn).unwrap();
        assert_eq!(stale.into_iter().collect::<Vec<_>>(), vec!["a.md", "b.md"]);

        let source: String = conn
            .query_row("SELECT source FROM stale_nodes WHERE path = 'a.md'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(source, "Edit");
    }

    #[test]
    fn clear_removes_everything() {
        let conn = open_memory_database().unwrap();
        for p in ["a.md", "b.md", "c.md"] {
            mark_stale(&conn, p, None).unwrap();
        }
        assert_eq!(stale_count(&conn).unwrap(), 3);
        assert_eq!(clear_stale(&conn).unwrap(), 3);
        assert!(load_stale_nodes(&conn).unwrap().is_empty());
    }

    #[test]
    fn record_build_stores_time_and_clears_staleness() {
        let mut conn = open_memory_database().unwrap();
        assert!(last_built_at(&conn).unwrap().is_none());

        mark_stale(&conn, "a.md", None).unwrap();
        let built_at = Utc::now();
        record_build(&mut conn, built_at, built_at, 42).unwrap();

        assert_eq!(last_built_at(&conn).unwrap(), Some(built_at));
        assert_eq!(stale_count(&conn).unwrap(), 0);
    }

    #[test]
    fn marks_after_build_start_survive_record() {
        let mut conn = open_memory_database().unwrap();
        let at = |s: &str| DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc);
        for (path, marked_at) in [
            ("early.md", "2024-05-01T11:59:59.999999Z"),
            ("late.md", "2024-05-01T12:00:00.000001Z"),
        ] {
            conn.execute(
                "INSERT INTO stale_nodes (path, marked_at) VALUES (?1, ?2)",
                params![path, marked_at],
            )
            .unwrap();
        }

        record_build(&mut conn, at("2024-05-01T12:00:00Z"), at("2024-05-01T12:00:05Z"), 2).unwrap();

        let stale = load_stale_nodes(&conn).unwrap();
        assert_eq!(stale.into_iter().collect::<Vec<_>>(), vec!["late.md"]);
    }

    #[test]
    fn malformed_timestamp_reads_as_none() {
        let conn = open_memory_database().unwrap();
        conn.execute(
            "INSERT INTO build_meta (key, value) VALUES ('last_built_at', 'yesterday')",
            [],
        )
        .unwrap();
        assert!(last_built_at(&conn).unwrap().is_none());
    }
}

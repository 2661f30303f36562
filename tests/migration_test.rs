mod helpers;

use strata::db;
use strata::db::migrations::{get_schema_version, run_migrations, CURRENT_SCHEMA_VERSION};
use tempfile::TempDir;

#[test]
fn fresh_db_migrates_to_current_version() {
    let conn = helpers::test_db();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn migrations_are_idempotent() {
    let conn = helpers::test_db();
    // Running again should be a no-op
    run_migrations(&conn).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn manual_v1_db_upgrades_correctly() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    db::schema::init_schema(&conn).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), 1);

    run_migrations(&conn).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);

    // v2 column is usable
    conn.execute(
        "INSERT INTO stale_nodes (path, marked_at, source) VALUES ('a.md', '2024-01-01T00:00:00Z', 'Write')",
        [],
    )
    .unwrap();
}

#[test]
fn open_creates_new_db_at_nonexistent_path() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("subdir").join("new.db");
    assert!(!db_path.exists());

    let conn = db::open_database(&db_path).unwrap();
    assert!(db_path.exists());

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM stale_nodes", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn reopening_preserves_data() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("meta.db");
    {
        let conn = db::open_database(&db_path).unwrap();
        strata::graph::staleness::mark_stale(&conn, "kept.md", None).unwrap();
    }
    let conn = db::open_database(&db_path).unwrap();
    let stale = strata::graph::staleness::load_stale_nodes(&conn).unwrap();
    assert!(stale.contains("kept.md"));
}

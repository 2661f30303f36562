#![allow(dead_code)]

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use strata::config::StrataConfig;
use strata::db;
use strata::graph::index::GraphIndex;
use tempfile::TempDir;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::schema::init_schema(&conn).unwrap();
    db::migrations::run_migrations(&conn).unwrap();
    conn
}

/// Frontmatter-bearing document text.
pub fn doc(layer: u8, tags: &[&str], body: &str) -> String {
    format!(
        "---\nlayer: {layer}\ntags: [{}]\ncreated: 2024-01-01\nupdated: 2024-02-01\n---\n{body}",
        tags.join(", ")
    )
}

/// Write `content` at `rel` under `root`, creating directories as needed.
pub fn write_doc(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    path
}

/// A temporary workspace with a `vault/` directory and config pointing at it.
pub struct TestVault {
    pub tmp: TempDir,
    pub config: StrataConfig,
}

impl TestVault {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let vault = tmp.path().join("vault");
        std::fs::create_dir_all(&vault).unwrap();

        let mut config = StrataConfig::default();
        config.vault.root = vault.to_string_lossy().into_owned();
        config.storage.db_path = tmp.path().join("metadata.db").to_string_lossy().into_owned();
        config.storage.snapshot_path = tmp.path().join("graph.json").to_string_lossy().into_owned();
        Self { tmp, config }
    }

    pub fn root(&self) -> PathBuf {
        self.config.resolved_vault_root()
    }

    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        write_doc(&self.root(), rel, content)
    }

    /// A small vault: an index with two linked project notes and a person.
    pub fn seeded() -> Self {
        let v = Self::new();
        v.write("index.md", &doc(1, &["core"], "# Home\nStart at [[apollo]].\n"));
        v.write(
            "projects/README.md",
            &doc(2, &["projects"], "# Projects\n"),
        );
        v.write(
            "projects/apollo.md",
            &doc(2, &["project", "space"], "# Apollo\nLed by [[ann]]. See [gemini](gemini.md).\n"),
        );
        v.write(
            "projects/gemini.md",
            &doc(2, &["project"], "# Gemini\nPredecessor of apollo.\n"),
        );
        v.write(
            "people/ann.md",
            &doc(3, &["person"], "# Ann\nWorks on things.\n"),
        );
        v
    }

    /// A graph index over this vault backed by an in-memory db.
    pub fn index(&self) -> GraphIndex {
        GraphIndex::new(&self.config, Arc::new(Mutex::new(test_db())))
    }
}

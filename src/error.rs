//! Typed errors surfaced across the tool boundary.
//!
//! Application plumbing (config, db setup, CLI) uses `anyhow`; operations whose
//! failures a caller must distinguish return [`IndexError`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    /// A query, navigate, or context request arrived before any graph exists.
    #[error("knowledge graph has not been built yet; run a rebuild first")]
    IndexNotBuilt,

    #[error("node not found: {id}")]
    NodeNotFound { id: String },

    /// A rebuild was requested while another one is running.
    #[error("a graph build is already in progress")]
    BuildInProgress,

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The vault root is missing or cannot be enumerated.
    #[error("vault error: {0}")]
    Vault(String),

    #[error("metadata store error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexError {
    /// The `{ "error": ... }` payload returned to tool callers.
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.to_string() })
    }
}

pub type IndexResult<T> = std::result::Result<T, IndexError>;

//! Marks documents stale when a watched tool writes to them.

use rusqlite::Connection;
use std::collections::HashSet;
use std::path::Path;

use crate::config::InvalidationConfig;
use crate::error::IndexResult;
use crate::graph::staleness::mark_stale;
use crate::vault::{relative_path, resolve_in_vault};

#[derive(Debug, Clone)]
pub struct Invalidator {
    tools: HashSet<String>,
}

impl Invalidator {
    pub fn new<I, S>(tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tools: tools.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &InvalidationConfig) -> Self {
        Self::new(config.tools.iter().cloned())
    }

    pub fn watches(&self, tool: &str) -> bool {
        self.tools.contains(tool)
    }

    /// Handle a write event. Returns `true` if a path was marked stale.
    ///
    /// `path` may be absolute or vault-relative. Events from unwatched tools and
    /// paths that are not markdown files inside the vault are ignored.
    pub fn handle(
        &self,
        conn: &Connection,
        vault_root: &Path,
        tool: &str,
        path: &str,
    ) -> IndexResult<bool> {
        if !self.watches(tool) {
            return Ok(false);
        }
        let Some(rel) = vault_relative(vault_root, path) else {
            tracing::debug!(tool, path, "write outside vault ignored");
            return Ok(false);
        };
        if !rel.ends_with(".md") {
            return Ok(false);
        }
        mark_stale(conn, &rel, Some(tool))?;
        tracing::info!(tool, path = %rel, "document marked stale");
        Ok(true)
    }
}

fn vault_relative(root: &Path, path: &str) -> Option<String> {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        return relative_path(root, candidate);
    }
    resolve_in_vault(root, path)?;
    relative_path(root, &root.join(candidate))
}

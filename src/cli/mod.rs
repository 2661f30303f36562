pub mod build;
pub mod context;
pub mod mark_stale;
pub mod navigate;
pub mod query;
pub mod status;

use anyhow::{Context, Result};
use std::sync::{Arc, Mutex};
use strata::config::StrataConfig;
use strata::graph::index::GraphIndex;
use strata::graph::types::KnowledgeGraph;

/// Open the metadata db and a graph index over the configured vault, restoring
/// the persisted snapshot if there is one.
pub fn open_index(config: &StrataConfig) -> Result<GraphIndex> {
    let conn = strata::db::open_database(config.resolved_db_path())?;
    let index = GraphIndex::new(config, Arc::new(Mutex::new(conn)));
    index
        .load_snapshot()
        .context("failed to load graph snapshot")?;
    Ok(index)
}

/// The restored snapshot, or an error telling the user to build first.
pub fn require_graph(index: &GraphIndex) -> Result<Arc<KnowledgeGraph>> {
    index
        .snapshot()
        .context("no graph snapshot found; run `strata build` first")
}

//! JSON persistence for graph snapshots.

use std::path::Path;

use crate::error::IndexResult;
use crate::graph::types::KnowledgeGraph;

/// Write the snapshot next to `path` and rename it into place, so a reader
/// never sees a half-written file.
pub fn save_snapshot(path: &Path, graph: &KnowledgeGraph) -> IndexResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_vec_pretty(graph)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;

    tracing::debug!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "snapshot saved"
    );
    Ok(())
}

/// Load a snapshot, or `None` if none has been written yet.
pub fn load_snapshot(path: &Path) -> IndexResult<Option<KnowledgeGraph>> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let graph: KnowledgeGraph = serde_json::from_slice(&bytes)?;
    tracing::info!(
        path = %path.display(),
        nodes = graph.node_count(),
        built_at = %graph.built_at().to_rfc3339(),
        "snapshot loaded"
    );
    Ok(Some(graph))
}

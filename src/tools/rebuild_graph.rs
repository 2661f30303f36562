//! MCP `rebuild_graph` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `rebuild_graph` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RebuildGraphParams {
    /// Reuse cached parses for unchanged, non-stale documents.
    #[schemars(
        description = "If true, only reparse documents that are stale or modified since the last build. Defaults to false (full rebuild)."
    )]
    pub incremental: Option<bool>,
}

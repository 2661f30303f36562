//! MCP `query_graph` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `query_graph` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct QueryGraphParams {
    /// Seed terms: document paths, title fragments, or tags.
    #[schemars(
        description = "Seed terms. Each is matched as a document path (with or without .md), else as a case-insensitive title substring or tag."
    )]
    pub seed: Vec<String>,

    #[schemars(description = "Maximum number of results. Defaults to 10.")]
    pub max_results: Option<usize>,

    /// Per-hop decay factor in (0, 1].
    #[schemars(description = "Activation decay per hop, in (0, 1]. Defaults to 0.7.")]
    pub decay: Option<f64>,

    #[schemars(description = "Minimum activation score to keep or expand a node, in [0, 1]. Defaults to 0.1.")]
    pub threshold: Option<f64>,

    #[schemars(description = "Maximum hops from any seed. Defaults to 5.")]
    pub max_hops: Option<usize>,

    /// Only return documents in these layers (1-5). Propagation is unaffected.
    #[schemars(description = "Only return documents in these layers (1-5). Other layers still carry activation.")]
    pub layer_filter: Option<Vec<u8>>,
}

//! MCP `navigate_node` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `navigate_node` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct NavigateNodeParams {
    /// Vault-relative document path.
    #[schemars(description = "Node id: the document's vault-relative path, e.g. 'projects/apollo.md'")]
    pub id: String,

    #[schemars(description = "If true, also return hierarchy parents, children, and siblings.")]
    pub include_hierarchy: Option<bool>,
}

//! MCP `get_context` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `get_context` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetContextParams {
    /// Free-text query. Tried whole as a seed, then word by word.
    #[schemars(description = "Free-text query used to seed activation")]
    pub query: String,

    #[schemars(description = "Token budget for the assembled context. Defaults to 2000.")]
    pub token_budget: Option<usize>,

    #[schemars(description = "If true, include full document bodies instead of excerpts.")]
    pub include_full: Option<bool>,
}

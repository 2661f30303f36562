//! MCP `mark_stale` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `mark_stale` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MarkStaleParams {
    /// Absolute or vault-relative path of the written file.
    #[schemars(description = "Path of the file that was written, absolute or relative to the vault root")]
    pub path: String,

    /// Name of the tool that wrote the file. Only watched tools mark paths stale.
    #[schemars(description = "Name of the tool that performed the write, e.g. 'Write' or 'Edit'")]
    pub tool: String,
}

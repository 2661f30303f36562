//! MCP `read_document` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `read_document` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ReadDocumentParams {
    #[schemars(description = "Vault-relative path of the document to read")]
    pub path: String,
}

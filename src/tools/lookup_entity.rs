//! MCP `lookup_entity` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `lookup_entity` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LookupEntityParams {
    /// Entity name or alias, matched case-insensitively.
    #[schemars(description = "Entity name or any alias (case-insensitive), e.g. 'Sam' or 'claude code'")]
    pub term: String,

    /// Maximum number of documents to return. Defaults to the configured limit.
    #[schemars(description = "Maximum number of documents to return, most recent first")]
    pub limit: Option<usize>,
}

//! MCP `cross_reference` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `cross_reference` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CrossReferenceParams {
    /// Names or aliases; every one must be mentioned by a returned document.
    #[schemars(description = "Two or more entity names or aliases. Returns documents mentioning all of them.")]
    pub terms: Vec<String>,
}

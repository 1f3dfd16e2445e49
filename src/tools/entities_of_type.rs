//! MCP `entities_of_type` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `entities_of_type` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct EntitiesOfTypeParams {
    /// One of `person`, `project`, `tool`, `repo`, `concept`, `org`.
    #[schemars(description = "Entity type: 'person', 'project', 'tool', 'repo', 'concept', 'org'")]
    pub r#type: String,

    /// If true, include each entity's documents.
    #[schemars(description = "If true, include each entity's documents (most recent first)")]
    pub include_docs: Option<bool>,
}

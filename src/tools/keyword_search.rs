use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct KeywordSearchParams {
    #[schemars(description = "Text to find in document content (case-insensitive). Slow; prefer lookup_entity.")]
    pub keyword: String,

    #[schemars(description = "Only scan documents dated on or after this day (YYYY-MM-DD). Defaults to the configured window.")]
    pub since: Option<String>,

    #[schemars(description = "Only scan documents dated before this day (YYYY-MM-DD)")]
    pub until: Option<String>,

    #[schemars(description = "Maximum number of matches to return")]
    pub limit: Option<usize>,
}

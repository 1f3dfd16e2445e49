use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DocsInRangeParams {
    #[schemars(description = "Inclusive start: RFC 3339 timestamp or YYYY-MM-DD")]
    pub start: String,

    #[schemars(description = "Exclusive end: RFC 3339 timestamp or YYYY-MM-DD")]
    pub end: String,
}

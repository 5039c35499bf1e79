use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Limits and coercion rules applied to every query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryDefaults {
    /// Upper bound for any `limit()`, when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_limit: Option<u32>,
    /// Limit used when neither the expression nor the caller gives one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_limit: Option<u32>,
    /// Reject comparisons and aggregates over JSON columns whose SQL type
    /// cannot be inferred, instead of passing the extracted value through.
    #[serde(default)]
    pub strict_json_types: bool,
}

impl QueryDefaults {
    pub fn is_default(&self) -> bool {
        self == &QueryDefaults::default()
    }
}

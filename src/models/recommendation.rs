use serde::{Deserialize, Serialize};

/// Structured answer from the recommendation model.
///
/// `reasoning` and `suggested_service_ids` are mandatory; a payload without
/// them is malformed and rejected by deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(default)]
    pub recommended_category: Option<String>,
    pub reasoning: String,
    pub suggested_service_ids: Vec<String>,
}

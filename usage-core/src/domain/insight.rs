use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Narrative insight produced by the external text-generation capability
/// from a prompt built out of reading data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub summary: String,
    pub recommendations: Vec<String>,
    pub generated_at: OffsetDateTime,
}

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Envelope metadata shared by list responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct Meta {
    pub count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub previous: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub next: Option<String>,
}

impl Meta {
    pub fn count_only(count: i64) -> Self {
        Self {
            count,
            ..Default::default()
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::issue::Severity;

/// Open issue counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct TargetSummary {
    pub error: i64,
    pub high: i64,
    pub medium: i64,
    pub low: i64,
    pub info: i64,
}

impl TargetSummary {
    pub fn add(&mut self, severity: Severity, count: i64) {
        let slot = match severity {
            Severity::Error => &mut self.error,
            Severity::High => &mut self.high,
            Severity::Medium => &mut self.medium,
            Severity::Low => &mut self.low,
            Severity::Info => &mut self.info,
        };
        *slot += count;
    }

    pub fn total(&self) -> i64 {
        self.error + self.high + self.medium + self.low + self.info
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, TS)]
pub struct Target {
    pub id: Uuid,
    #[sqlx(rename = "project_id")]
    pub project: Uuid,
    pub name: String,
    #[sqlx(json)]
    pub summary: TargetSummary,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

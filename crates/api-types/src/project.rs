use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, TS)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    #[sqlx(rename = "owner_id")]
    pub owner: Uuid,
    pub created: DateTime<Utc>,
}

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, TS)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
    pub admin: bool,
}

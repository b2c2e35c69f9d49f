use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use ts_rs::TS;
use uuid::Uuid;

use crate::pagination::Meta;

/// Kind of object a comment is linked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, TS)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CommentType {
    Issue,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, TS)]
pub struct Comment {
    pub id: Uuid,
    #[sqlx(rename = "owner_id")]
    pub owner: Uuid,
    #[serde(rename = "type")]
    #[sqlx(rename = "link_type")]
    pub kind: CommentType,
    #[sqlx(rename = "link_id")]
    pub link: Uuid,
    pub text: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct CommentEntity {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CommentList {
    #[serde(flatten)]
    pub meta: Meta,
    pub results: Vec<Comment>,
}

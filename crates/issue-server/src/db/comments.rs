use api_types::{Comment, CommentType};
use chrono::Utc;
use sqlx::{Executor, Sqlite};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct CommentRepository;

impl CommentRepository {
    pub async fn create<'e, E>(
        executor: E,
        owner: Uuid,
        kind: CommentType,
        link: Uuid,
        text: &str,
    ) -> Result<Comment, CommentError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now();
        let record = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, owner_id, link_type, link_id, text, created, updated)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING id, owner_id, link_type, link_id, text, created, updated
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(kind)
        .bind(link)
        .bind(text)
        .bind(now)
        .fetch_one(executor)
        .await?;

        Ok(record)
    }

    /// All comments linked to an object, oldest first.
    pub async fn list_by_link<'e, E>(
        executor: E,
        kind: CommentType,
        link: Uuid,
    ) -> Result<Vec<Comment>, CommentError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let records = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, owner_id, link_type, link_id, text, created, updated
            FROM comments
            WHERE link_type = $1 AND link_id = $2
            ORDER BY created ASC, rowid ASC
            "#,
        )
        .bind(kind)
        .bind(link)
        .fetch_all(executor)
        .await?;

        Ok(records)
    }

    pub async fn delete_by_link<'e, E>(
        executor: E,
        kind: CommentType,
        link: Uuid,
    ) -> Result<u64, CommentError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM comments WHERE link_type = $1 AND link_id = $2")
            .bind(kind)
            .bind(link)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}

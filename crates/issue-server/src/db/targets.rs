use api_types::{Target, TargetSummary};
use chrono::Utc;
use sqlx::{Executor, Sqlite, SqliteConnection, types::Json};
use thiserror::Error;
use uuid::Uuid;

use super::issues::{IssueError, IssueRepository};

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("target not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("issue error: {0}")]
    Issue(#[from] IssueError),
}

pub struct TargetRepository;

impl TargetRepository {
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Target>, TargetError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let record = sqlx::query_as::<_, Target>(
            r#"
            SELECT id, project_id, name, summary, created, updated
            FROM targets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(record)
    }

    pub async fn create<'e, E>(
        executor: E,
        project_id: Uuid,
        name: &str,
    ) -> Result<Target, TargetError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now();
        let record = sqlx::query_as::<_, Target>(
            r#"
            INSERT INTO targets (id, project_id, name, summary, created, updated)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id, project_id, name, summary, created, updated
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(name)
        .bind(Json(TargetSummary::default()))
        .bind(now)
        .fetch_one(executor)
        .await?;

        Ok(record)
    }

    /// Recomputes the denormalized summary of a target from its open issues.
    pub async fn update_summary(
        conn: &mut SqliteConnection,
        target_id: Uuid,
    ) -> Result<TargetSummary, TargetError> {
        let mut summary = TargetSummary::default();
        for (severity, count) in IssueRepository::open_counts(&mut *conn, target_id).await? {
            summary.add(severity, count);
        }

        let result = sqlx::query("UPDATE targets SET summary = $2, updated = $3 WHERE id = $1")
            .bind(target_id)
            .bind(Json(summary))
            .bind(Utc::now())
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TargetError::NotFound);
        }
        Ok(summary)
    }
}

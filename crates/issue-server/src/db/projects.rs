use api_types::Project;
use chrono::Utc;
use sqlx::{Executor, Sqlite};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct ProjectRepository;

impl ProjectRepository {
    pub async fn create<'e, E>(executor: E, name: &str, owner: Uuid) -> Result<Project, ProjectError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let record = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (id, name, owner_id, created)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, owner_id, created
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(owner)
        .bind(Utc::now())
        .fetch_one(executor)
        .await?;

        Ok(record)
    }

    pub async fn add_member<'e, E>(
        executor: E,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), ProjectError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Whether the user owns the project or is one of its members.
    pub async fn has_access<'e, E>(
        executor: E,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, ProjectError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let allowed = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM projects WHERE id = $1 AND owner_id = $2
                UNION ALL
                SELECT 1 FROM project_members WHERE project_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(executor)
        .await?;

        Ok(allowed)
    }
}

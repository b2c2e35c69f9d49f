use api_types::{Severity, TargetIssue};
use chrono::Utc;
use sqlx::{Executor, QueryBuilder, Sqlite, SqliteConnection, types::Json};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("issue not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Declared filter schema for listing issues.
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub project: Option<Uuid>,
    pub target: Option<Uuid>,
    pub severity: Option<Severity>,
    pub confirmed: Option<bool>,
    pub false_positive: Option<bool>,
    pub muted: Option<bool>,
    pub resolved: Option<bool>,
    /// Matched case-insensitively against summary and description.
    pub search: Option<String>,
    /// Restricts results to projects this user owns or is a member of.
    pub visible_to: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: &'static str,
    pub descending: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Opts {
    pub sort: Vec<SortKey>,
    pub skip: i64,
    pub limit: i64,
}

const COLUMNS: &str = r#"
    id, project_id, target_id, uniq_id, summary, description, severity,
    urls, extras, reference_links, confirmed, false_positive, muted, resolved,
    activities, created, updated
"#;

pub struct IssueRepository;

impl IssueRepository {
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<TargetIssue>, IssueError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let record = sqlx::query_as::<_, TargetIssue>(&format!(
            "SELECT {COLUMNS} FROM issues WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(record)
    }

    pub async fn create<'e, E>(executor: E, issue: &TargetIssue) -> Result<TargetIssue, IssueError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let record = sqlx::query_as::<_, TargetIssue>(&format!(
            r#"
            INSERT INTO issues ({COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(issue.id)
        .bind(issue.project)
        .bind(issue.target)
        .bind(issue.uniq_id.as_deref())
        .bind(&issue.summary)
        .bind(&issue.desc)
        .bind(issue.severity)
        .bind(Json(&issue.urls))
        .bind(Json(&issue.extras))
        .bind(Json(&issue.references))
        .bind(issue.confirmed)
        .bind(issue.false_positive)
        .bind(issue.muted)
        .bind(issue.resolved)
        .bind(Json(&issue.activities))
        .bind(issue.created)
        .bind(issue.updated)
        .fetch_one(executor)
        .await?;

        Ok(record)
    }

    /// Writes every mutable field of `issue` and bumps `updated`.
    pub async fn update<'e, E>(executor: E, issue: &TargetIssue) -> Result<TargetIssue, IssueError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let record = sqlx::query_as::<_, TargetIssue>(&format!(
            r#"
            UPDATE issues SET
                uniq_id         = $2,
                summary         = $3,
                description     = $4,
                severity        = $5,
                urls            = $6,
                extras          = $7,
                reference_links = $8,
                confirmed       = $9,
                false_positive  = $10,
                muted           = $11,
                resolved        = $12,
                activities      = $13,
                updated         = $14
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(issue.id)
        .bind(issue.uniq_id.as_deref())
        .bind(&issue.summary)
        .bind(&issue.desc)
        .bind(issue.severity)
        .bind(Json(&issue.urls))
        .bind(Json(&issue.extras))
        .bind(Json(&issue.references))
        .bind(issue.confirmed)
        .bind(issue.false_positive)
        .bind(issue.muted)
        .bind(issue.resolved)
        .bind(Json(&issue.activities))
        .bind(Utc::now())
        .fetch_optional(executor)
        .await?;

        record.ok_or(IssueError::NotFound)
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<(), IssueError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM issues WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(IssueError::NotFound);
        }
        Ok(())
    }

    /// Filtered, sorted, paginated read. Returns the page and the total
    /// number of matching issues.
    pub async fn filter(
        conn: &mut SqliteConnection,
        filter: &IssueFilter,
        opts: &Opts,
    ) -> Result<(Vec<TargetIssue>, i64), IssueError> {
        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM issues");
        push_conditions(&mut count_query, filter);
        let count = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&mut *conn)
            .await?;

        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM issues"));
        push_conditions(&mut query, filter);

        query.push(" ORDER BY ");
        for key in &opts.sort {
            query.push(key.column);
            query.push(if key.descending { " DESC, " } else { " ASC, " });
        }
        query.push("rowid ASC");

        query
            .push(" LIMIT ")
            .push_bind(opts.limit)
            .push(" OFFSET ")
            .push_bind(opts.skip);

        let records = query
            .build_query_as::<TargetIssue>()
            .fetch_all(&mut *conn)
            .await?;

        Ok((records, count))
    }

    /// Open issue counts for a target, grouped by severity.
    pub async fn open_counts<'e, E>(
        executor: E,
        target_id: Uuid,
    ) -> Result<Vec<(Severity, i64)>, IssueError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, (Severity, i64)>(
            r#"
            SELECT severity, COUNT(*)
            FROM issues
            WHERE target_id = $1
              AND false_positive = 0
              AND muted = 0
              AND resolved = 0
            GROUP BY severity
            "#,
        )
        .bind(target_id)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }
}

fn push_conditions(query: &mut QueryBuilder<'_, Sqlite>, filter: &IssueFilter) {
    query.push(" WHERE 1 = 1");

    if let Some(project) = filter.project {
        query.push(" AND project_id = ").push_bind(project);
    }
    if let Some(target) = filter.target {
        query.push(" AND target_id = ").push_bind(target);
    }
    if let Some(severity) = filter.severity {
        query.push(" AND severity = ").push_bind(severity);
    }
    for (column, value) in [
        ("confirmed", filter.confirmed),
        ("false_positive", filter.false_positive),
        ("muted", filter.muted),
        ("resolved", filter.resolved),
    ] {
        if let Some(value) = value {
            query.push(" AND ").push(column).push(" = ").push_bind(value);
        }
    }
    if let Some(search) = &filter.search {
        query
            .push(" AND (instr(lower(summary), lower(")
            .push_bind(search.clone())
            .push(")) > 0 OR instr(lower(description), lower(")
            .push_bind(search.clone())
            .push(")) > 0)");
    }
    if let Some(user_id) = filter.visible_to {
        query
            .push(" AND project_id IN (SELECT id FROM projects WHERE owner_id = ")
            .push_bind(user_id)
            .push(" UNION SELECT project_id FROM project_members WHERE user_id = ")
            .push_bind(user_id)
            .push(")");
    }
}

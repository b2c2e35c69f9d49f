//! Extractors that resolve request-scoped resources before a handler runs.

use api_types::TargetIssue;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use tracing::instrument;
use uuid::Uuid;

use super::{error::ErrorResponse, permissions::ensure_project_access};
use crate::{
    AppState,
    auth::RequestContext,
    db::{Manager, issues::IssueRepository},
};

impl FromRequestParts<AppState> for Manager {
    type Rejection = ErrorResponse;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Manager::acquire(state.pool()).await.map_err(|error| {
            tracing::error!(?error, "failed to acquire database connection");
            ErrorResponse::internal()
        })
    }
}

/// An issue loaded from the `{issueId}` path segment, together with the
/// manager that loaded it. Construction fails with 400 on a malformed id,
/// 404 when the issue is missing and 401/403 when the caller may not see
/// the issue's project.
pub struct IssueGuard {
    pub issue: TargetIssue,
    pub mgr: Manager,
}

impl FromRequestParts<AppState> for IssueGuard {
    type Rejection = ErrorResponse;

    #[instrument(name = "issues.guard", skip_all)]
    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ctx = RequestContext::from_request_parts(parts, state).await?;

        let Path(raw_id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ErrorResponse::bad_request("wrong id format"))?;
        let issue_id =
            Uuid::parse_str(&raw_id).map_err(|_| ErrorResponse::bad_request("wrong id format"))?;

        let mut mgr = Manager::from_request_parts(parts, state).await?;

        let issue = IssueRepository::find_by_id(mgr.conn(), issue_id)
            .await
            .map_err(|error| {
                tracing::error!(?error, %issue_id, "failed to load issue");
                ErrorResponse::internal()
            })?
            .ok_or_else(ErrorResponse::not_found)?;

        ensure_project_access(mgr.conn(), &ctx.user, issue.project).await?;

        Ok(Self { issue, mgr })
    }
}

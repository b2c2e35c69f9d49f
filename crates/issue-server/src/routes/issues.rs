use api_types::{
    Comment, CommentEntity, CommentList, CommentType, ListIssuesQuery, Meta, TargetIssue,
    TargetIssueEntity, TargetIssueList,
};
use axum::{
    Json, Router,
    extract::{OriginalUri, Query, State, rejection::QueryRejection},
    http::StatusCode,
    middleware,
};
use sqlx::Connection;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use super::{
    definition::ServiceDefinition,
    error::{ErrorResponse, JsonBody, db_error},
    guard::IssueGuard,
    pagination::Sorter,
    permissions::ensure_project_access,
};
use crate::{
    AppState,
    auth::{RequestContext, authenticate, require_user},
    db::{
        Manager,
        comments::CommentRepository,
        issues::{IssueError, IssueFilter, IssueRepository, Opts},
        targets::TargetRepository,
    },
};

const ISSUE_SORTER: Sorter = Sorter::new(&["created", "updated"]);

/// Route and documentation definition for the issues resource.
pub fn service() -> ServiceDefinition<TargetIssue, TargetIssueEntity, TargetIssueEntity> {
    ServiceDefinition::new("/api/v1/issues", "issueId")
        .list::<TargetIssueList, _, _>(list_issues)
        .create(create_issue)
        .get(get_issue)
        .update(update_issue)
        .delete(delete_issue)
        .sub_list::<CommentList, _, _>("comments", "comments", list_comments)
        .sub_create::<CommentEntity, Comment, _, _>("comments", "commentsAdd", add_comment)
}

/// Issue routes behind token authentication and the auth-required check.
pub fn router(state: &AppState) -> Router<AppState> {
    // route_layer wraps outside-in: authenticate runs before require_user.
    service()
        .router()
        .route_layer(middleware::from_fn(require_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
}

#[instrument(name = "issues.list", skip_all, fields(user_id = %ctx.user.id))]
async fn list_issues(
    State(state): State<AppState>,
    ctx: RequestContext,
    OriginalUri(uri): OriginalUri,
    query: Result<Query<ListIssuesQuery>, QueryRejection>,
    mut mgr: Manager,
) -> Result<Json<TargetIssueList>, ErrorResponse> {
    let Query(query) = query.map_err(|rejection| {
        tracing::debug!(reason = %rejection.body_text(), "rejected list query");
        ErrorResponse::bad_request("wrong query")
    })?;

    if let Some(project_id) = query.project {
        ensure_project_access(mgr.conn(), &ctx.user, project_id).await?;
    }

    let text_search = state.config().text_search_enabled;
    let filter = IssueFilter {
        project: query.project,
        target: query.target,
        severity: query.severity,
        confirmed: query.confirmed,
        false_positive: query.false_positive,
        muted: query.muted,
        resolved: query.resolved,
        search: query
            .search
            .filter(|term| text_search && !term.trim().is_empty()),
        visible_to: (!ctx.user.admin).then_some(ctx.user.id),
    };

    let (skip, limit) = state.paginator().parse(query.skip, query.limit);
    let opts = Opts {
        sort: ISSUE_SORTER.parse(query.sort.as_deref()),
        skip,
        limit,
    };

    let (results, count) = IssueRepository::filter(mgr.conn(), &filter, &opts)
        .await
        .map_err(|error| {
            tracing::error!(?error, "failed to list issues");
            ErrorResponse::internal()
        })?;

    let (previous, next) = state.paginator().urls(&uri, skip, limit, count);

    Ok(Json(TargetIssueList {
        meta: Meta {
            count,
            previous,
            next,
        },
        results,
    }))
}

#[instrument(name = "issues.create", skip_all, fields(user_id = %ctx.user.id))]
async fn create_issue(
    State(state): State<AppState>,
    ctx: RequestContext,
    JsonBody(entity): JsonBody<TargetIssueEntity>,
) -> Result<(StatusCode, Json<TargetIssue>), ErrorResponse> {
    let target_id = entity
        .target
        .as_deref()
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or_else(|| ErrorResponse::bad_request("Target is wrong"))?;

    entity
        .validate_creating()
        .map_err(|errors| ErrorResponse::bad_request(format!("Validation error: {errors}")))?;

    // Leased only once the body has been read and checked.
    let mut mgr = Manager::acquire(state.pool()).await.map_err(|error| {
        tracing::error!(?error, "failed to acquire database connection");
        ErrorResponse::internal()
    })?;

    let target = TargetRepository::find_by_id(mgr.conn(), target_id)
        .await
        .map_err(|error| {
            tracing::error!(?error, %target_id, "failed to load target");
            ErrorResponse::internal()
        })?
        .ok_or_else(|| ErrorResponse::bad_request("Target not found"))?;

    ensure_project_access(mgr.conn(), &ctx.user, target.project).await?;

    let mut issue = TargetIssue::new(target.project, target.id);
    entity.apply_to(&mut issue);
    issue.add_user_report_activity(ctx.user.id);

    let issue = IssueRepository::create(mgr.conn(), &issue)
        .await
        .map_err(|error| db_error(error, "failed to create issue"))?;
    drop(mgr);

    tracing::info!(issue_id = %issue.id, target_id = %issue.target, "issue reported");
    state.summaries().submit(issue.target);

    Ok((StatusCode::CREATED, Json(issue)))
}

#[instrument(name = "issues.get", skip_all, fields(issue_id = %guard.issue.id))]
async fn get_issue(guard: IssueGuard) -> Json<TargetIssue> {
    Json(guard.issue)
}

#[instrument(name = "issues.update", skip_all, fields(issue_id = %issue.id))]
async fn update_issue(
    State(state): State<AppState>,
    IssueGuard { mut issue, mut mgr }: IssueGuard,
    JsonBody(entity): JsonBody<TargetIssueEntity>,
) -> Result<Json<TargetIssue>, ErrorResponse> {
    entity
        .validate()
        .map_err(|errors| ErrorResponse::bad_request(format!("Validation error: {errors}")))?;

    let summary_changed = entity.apply_to(&mut issue);

    let issue = IssueRepository::update(mgr.conn(), &issue)
        .await
        .map_err(|error| match error {
            IssueError::NotFound => ErrorResponse::not_found(),
            error => db_error(error, "failed to update issue"),
        })?;
    drop(mgr);

    if summary_changed {
        state.summaries().submit(issue.target);
    }

    Ok(Json(issue))
}

#[instrument(name = "issues.delete", skip_all, fields(issue_id = %issue.id))]
async fn delete_issue(
    State(state): State<AppState>,
    IssueGuard { issue, mut mgr }: IssueGuard,
) -> Result<StatusCode, ErrorResponse> {
    let mut tx = mgr.conn().begin().await.map_err(|error| {
        tracing::error!(?error, "failed to begin transaction");
        ErrorResponse::internal()
    })?;

    CommentRepository::delete_by_link(&mut *tx, CommentType::Issue, issue.id)
        .await
        .map_err(|error| db_error(error, "failed to delete issue"))?;

    IssueRepository::delete(&mut *tx, issue.id)
        .await
        .map_err(|error| match error {
            IssueError::NotFound => ErrorResponse::not_found(),
            error => db_error(error, "failed to delete issue"),
        })?;

    tx.commit()
        .await
        .map_err(|error| db_error(error, "failed to delete issue"))?;
    drop(mgr);

    state.summaries().submit(issue.target);

    Ok(StatusCode::NO_CONTENT)
}

#[instrument(name = "issues.comments", skip_all, fields(issue_id = %issue.id))]
async fn list_comments(
    IssueGuard { issue, mut mgr }: IssueGuard,
) -> Result<Json<CommentList>, ErrorResponse> {
    let results = CommentRepository::list_by_link(mgr.conn(), CommentType::Issue, issue.id)
        .await
        .map_err(|error| {
            tracing::error!(?error, "failed to list comments");
            ErrorResponse::internal()
        })?;

    Ok(Json(CommentList {
        meta: Meta::count_only(results.len() as i64),
        results,
    }))
}

#[instrument(
    name = "issues.comments_add",
    skip_all,
    fields(issue_id = %issue.id, user_id = %ctx.user.id)
)]
async fn add_comment(
    ctx: RequestContext,
    IssueGuard { issue, mut mgr }: IssueGuard,
    JsonBody(entity): JsonBody<CommentEntity>,
) -> Result<(StatusCode, Json<Comment>), ErrorResponse> {
    if entity.text.is_empty() {
        return Err(ErrorResponse::bad_request("Text is required"));
    }

    let comment = CommentRepository::create(
        mgr.conn(),
        ctx.user.id,
        CommentType::Issue,
        issue.id,
        &entity.text,
    )
    .await
    .map_err(|error| db_error(error, "failed to add comment"))?;

    Ok((StatusCode::CREATED, Json(comment)))
}

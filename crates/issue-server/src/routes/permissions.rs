use api_types::User;
use axum::http::StatusCode;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::error::ErrorResponse;
use crate::db::projects::ProjectRepository;

/// Project-level permission check. Admins pass unconditionally, everyone
/// else must own the project or be a member of it. Unknown projects are
/// reported as forbidden.
pub(crate) async fn ensure_project_access(
    conn: &mut SqliteConnection,
    user: &User,
    project_id: Uuid,
) -> Result<(), ErrorResponse> {
    if user.admin {
        return Ok(());
    }

    let allowed = ProjectRepository::has_access(conn, project_id, user.id)
        .await
        .map_err(|error| {
            tracing::error!(?error, %project_id, user_id = %user.id, "failed to check project access");
            ErrorResponse::internal()
        })?;

    if !allowed {
        tracing::debug!(%project_id, user_id = %user.id, "project access denied");
        return Err(ErrorResponse::new(
            StatusCode::FORBIDDEN,
            "you do not have permission for this project",
        ));
    }

    Ok(())
}

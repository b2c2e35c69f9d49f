use api_types::User;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{
    AppState,
    db::users::{TokenRepository, UserRepository},
    routes::error::ErrorResponse,
};

/// The authenticated caller, attached to the request by [`authenticate`].
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user: User,
}

/// Resolves a bearer token to a user. Requests without a recognised token
/// pass through unauthenticated; [`require_user`] decides what to do with them.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ErrorResponse> {
    if let Some(Authorization(bearer)) = request.headers().typed_get::<Authorization<Bearer>>() {
        let token_hash = TokenRepository::hash(bearer.token());
        match UserRepository::find_by_token_hash(state.pool(), &token_hash).await {
            Ok(Some(user)) => {
                crate::configure_user_scope(user.id, Some(&user.nickname), Some(&user.email));
                request.extensions_mut().insert(RequestContext { user });
            }
            Ok(None) => tracing::debug!("unknown api token"),
            Err(error) => {
                tracing::error!(?error, "failed to resolve api token");
                return Err(ErrorResponse::internal());
            }
        }
    }

    Ok(next.run(request).await)
}

pub async fn require_user(request: Request, next: Next) -> Result<Response, ErrorResponse> {
    if request.extensions().get::<RequestContext>().is_none() {
        return Err(unauthorized());
    }
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ErrorResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(unauthorized)
    }
}

fn unauthorized() -> ErrorResponse {
    ErrorResponse::new(StatusCode::UNAUTHORIZED, "authorization required")
}

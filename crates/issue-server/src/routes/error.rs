use axum::{
    Json,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::json;

#[derive(Debug)]
pub struct ErrorResponse {
    status: StatusCode,
    message: String,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not found")
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "database error")
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Classifies a storage failure. Unique violations become 409, everything
/// else is reported as an opaque 500.
pub(crate) fn db_error(
    error: impl std::error::Error + 'static,
    fallback_message: &str,
) -> ErrorResponse {
    let error: &(dyn std::error::Error + 'static) = &error;
    let mut current = Some(error);

    while let Some(err) = current {
        if let Some(sqlx::Error::Database(db_err)) = err.downcast_ref::<sqlx::Error>() {
            if db_err.is_unique_violation() {
                return ErrorResponse::new(StatusCode::CONFLICT, "resource already exists");
            }
            if db_err.is_foreign_key_violation() {
                return ErrorResponse::bad_request("related resource not found");
            }
            break;
        }
        current = err.source();
    }

    tracing::error!(error = %error, "storage failure");
    ErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR, fallback_message)
}

/// JSON request body whose rejections map to a 400 `wrong entity` response.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ErrorResponse;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(reason = %rejection.body_text(), "rejected request entity");
                ErrorResponse::bad_request("wrong entity")
            })?;
        Ok(Self(value))
    }
}

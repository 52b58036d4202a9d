use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use contentflow_content::ContentError;
use contentflow_core::error::CoreError;
use contentflow_db::store::StoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain, content and store errors and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON error
/// responses of the form `{"error": ..., "code": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `contentflow_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An error from the content service.
    #[error(transparent)]
    Content(#[from] ContentError),

    /// A store error from a direct store call.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

type ErrorParts = (StatusCode, &'static str, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Content(content) => match content {
                ContentError::Core(core) => classify_core_error(core),
                ContentError::VersionNotFound { .. } => {
                    (StatusCode::NOT_FOUND, "VERSION_NOT_FOUND", content.to_string())
                }
                ContentError::Store(store) => classify_store_error(store),
            },
            AppError::Store(store) => classify_store_error(store),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> ErrorParts {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn classify_core_error(err: &CoreError) -> ErrorParts {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

/// Unique violations map to 409; everything else is a sanitized 500.
fn classify_store_error(err: &StoreError) -> ErrorParts {
    match err {
        StoreError::Conflict(constraint) => (
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("Duplicate value violates unique constraint: {constraint}"),
        ),
        StoreError::Database(sqlx::Error::RowNotFound) => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        StoreError::Database(db_err) => {
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
    }
}

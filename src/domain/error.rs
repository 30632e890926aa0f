use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// SQLite result codes surfaced to callers as retryable conflicts.
const SQLITE_BUSY_CODES: [&str; 2] = ["5", "517"];
const SQLITE_UNIQUE_CODES: [&str; 2] = ["1555", "2067"];

#[derive(Debug, thiserror::Error)]
pub enum TaskdeckError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Single place where storage error codes are classified. SQLite busy and
/// unique-constraint codes become `Conflict` so callers can retry; anything
/// else is an opaque `Database` failure.
impl From<sqlx::Error> for TaskdeckError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if let Some(code) = db_err.code() {
                if SQLITE_BUSY_CODES.contains(&code.as_ref()) {
                    return TaskdeckError::Conflict(
                        "storage is busy, retry the operation".into(),
                    );
                }
                if SQLITE_UNIQUE_CODES.contains(&code.as_ref()) {
                    return TaskdeckError::Conflict("duplicate key".into());
                }
            }
        }
        TaskdeckError::Database(err)
    }
}

impl IntoResponse for TaskdeckError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            TaskdeckError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            TaskdeckError::InvalidTarget(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            TaskdeckError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            TaskdeckError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            TaskdeckError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            TaskdeckError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
            TaskdeckError::Database(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
            TaskdeckError::Serialization(err) => {
                tracing::error!("Serialization error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
        };

        let body = json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

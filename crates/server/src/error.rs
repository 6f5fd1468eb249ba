use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use galleria_core::CoreError;
use galleria_storage::StorageError;
use serde_json::json;
use thiserror::Error;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Stored data exists but cannot be parsed
    #[error("Corrupt data: {0}")]
    Corrupt(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ServerError::Corrupt(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ServerError::Core(CoreError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg),
            ServerError::Storage(StorageError::NotFound(key)) => {
                (StatusCode::NOT_FOUND, format!("'{}' not found", key))
            }
            ServerError::Storage(StorageError::InvalidPath(msg)) => (StatusCode::BAD_REQUEST, msg),
            ServerError::Storage(err) => {
                tracing::error!("Storage failure: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage backend error".to_string(),
                )
            }
            other => {
                tracing::error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

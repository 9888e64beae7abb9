use axum::{extract::multipart::MultipartError, http::StatusCode, response::IntoResponse};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum DocuploadError {
    #[error("{0}")]
    IO(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    Url(#[from] url::ParseError),

    #[error("{0}")]
    Multipart(#[from] MultipartError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl IntoResponse for DocuploadError {
    fn into_response(self) -> axum::response::Response {
        match self {
            DocuploadError::InvalidArgument(e) | DocuploadError::Validation(e) => {
                (StatusCode::BAD_REQUEST, e).into_response()
            }
            DocuploadError::Multipart(e) => (StatusCode::BAD_REQUEST, e.body_text()).into_response(),
            DocuploadError::NotFound(e) => (StatusCode::NOT_FOUND, e).into_response(),
            DocuploadError::Conflict(e) => (StatusCode::CONFLICT, e).into_response(),
            DocuploadError::Cancelled => {
                debug!("Request cancelled before completion");
                // 499 Client Closed Request; nobody is left to read it
                StatusCode::from_u16(499)
                    .unwrap_or(StatusCode::REQUEST_TIMEOUT)
                    .into_response()
            }
            e => {
                error!("{e}");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
        }
    }
}

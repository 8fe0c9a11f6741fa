use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Request-level failures, each mapped to a status code and a JSON body of
/// the form `{"error": "<message>"}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid date format. Use YYYY-MM-DD.")]
    InvalidDate,

    #[error("{0}")]
    NoData(&'static str),

    #[error(transparent)]
    Storage(#[from] AppError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidDate => StatusCode::BAD_REQUEST,
            ApiError::NoData(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(e) => {
                error!("Request failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

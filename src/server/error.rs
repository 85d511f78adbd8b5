use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::error::MergeError;

/// Error side of every handler, rendered as `{ "error": ... }`
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound { message: String, missing: Vec<String> },
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(error) => (StatusCode::BAD_REQUEST, ErrorResponse { error, missing: None }),
            ApiError::NotFound { message, missing } => (
                StatusCode::NOT_FOUND,
                ErrorResponse { error: message, missing: Some(missing) },
            ),
            ApiError::Internal(error) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse { error, missing: None }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<MergeError> for ApiError {
    fn from(err: MergeError) -> Self {
        match err {
            MergeError::InvalidRequest(message) => ApiError::BadRequest(message),
            MergeError::MissingInputs(missing) => ApiError::NotFound {
                message: "Input files not found".to_string(),
                missing,
            },
            other => {
                error!("Merge failed: {}", other);
                ApiError::Internal(other.to_string())
            }
        }
    }
}

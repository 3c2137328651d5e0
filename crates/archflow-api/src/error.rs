use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use archflow_core::ArchFlowError;
use serde_json::json;
use thiserror::Error;

/// Transport-level error taxonomy. Auth and validation messages surface
/// verbatim to the caller; everything unexpected collapses to a 500.
/// Provider failures never reach this type — they are absorbed into a
/// degraded assessment upstream.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ArchFlowError> for ApiError {
    fn from(err: ArchFlowError) -> Self {
        match err {
            ArchFlowError::Validation(msg) => ApiError::Validation(msg),
            ArchFlowError::DuplicateUser => ApiError::Validation(err.to_string()),
            ArchFlowError::InvalidCredentials => ApiError::Auth(err.to_string()),
            ArchFlowError::NotFound(msg) => ApiError::NotFound(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

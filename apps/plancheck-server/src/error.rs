//! Error types for the plancheck server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared_dxf::DxfLoadError;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Could not read drawing: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Result not found: {0}")]
    ResultNotFound(String),

    #[error("Check timeout after {0}ms")]
    Timeout(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServerError::ParseError(_) => (StatusCode::UNPROCESSABLE_ENTITY, "DXF_PARSE_ERROR"),
            ServerError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ServerError::ResultNotFound(_) => (StatusCode::NOT_FOUND, "RESULT_NOT_FOUND"),
            ServerError::Timeout(_) => (StatusCode::REQUEST_TIMEOUT, "TIMEOUT"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<DxfLoadError> for ServerError {
    fn from(err: DxfLoadError) -> Self {
        match err {
            DxfLoadError::Parse(msg) => ServerError::ParseError(msg),
            DxfLoadError::Io(e) => ServerError::Internal(e.to_string()),
        }
    }
}

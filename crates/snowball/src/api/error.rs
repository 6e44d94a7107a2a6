//! API errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use snowball_protocol::ResourceError;

use crate::sandbox::SandboxError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request body failed validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The operation cannot be performed on this platform.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            ApiError::Unsupported(_) => (StatusCode::UNPROCESSABLE_ENTITY, "unsupported"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<ResourceError> for ApiError {
    fn from(err: ResourceError) -> Self {
        ApiError::InvalidRequest(err.to_string())
    }
}

impl From<SandboxError> for ApiError {
    fn from(err: SandboxError) -> Self {
        match err {
            SandboxError::UnsupportedPlatform(_) => ApiError::Unsupported(err.to_string()),
            SandboxError::EmptyCommand => ApiError::InvalidRequest(err.to_string()),
            SandboxError::Spawn(_) | SandboxError::NoPid => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

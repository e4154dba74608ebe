//! Structured error responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::DomainError;

/// Body of every failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: String,
    pub request_id: String,
}

/// API error with status code
///
/// Only two statuses are produced: 400 for bad input and 500 for a request
/// that was accepted but failed.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub request_id: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, request_id: &str) -> Self {
        Self {
            status,
            message: message.into(),
            request_id: request_id.to_string(),
        }
    }

    pub fn bad_request(message: impl Into<String>, request_id: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, request_id)
    }

    pub fn internal(message: impl Into<String>, request_id: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, request_id)
    }

    /// Maps a domain error onto the response taxonomy.
    ///
    /// Validation messages are returned as-is. Everything else gets a
    /// category message; the full error is logged with the request id.
    pub fn from_domain(err: DomainError, request_id: &str) -> Self {
        let message = match &err {
            DomainError::Validation { message } => {
                return Self::bad_request(message.clone(), request_id);
            }
            DomainError::Provider { .. } => "Image or language model provider failed",
            DomainError::Cache { .. } => "Cache backend unavailable",
            DomainError::Configuration { .. } | DomainError::Internal { .. } => "Internal error",
        };

        error!(request_id = %request_id, error = %err, "Request failed");
        Self::internal(message, request_id)
    }

    pub fn body(&self) -> ApiErrorResponse {
        ApiErrorResponse {
            success: false,
            error: self.message.clone(),
            request_id: self.request_id.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body())).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

//! Error handling utilities for API responses.
//!
//! Provides a small response envelope and the conversion between
//! service-layer errors and HTTP responses.
//!
//! # Error Handling Flow
//! 1. Service layer returns a domain-specific `ServiceError`
//! 2. `service_error_to_http` converts it to the appropriate status code and
//!    a `{message}` body
//!
//! Business-rule failures map to distinct 4xx responses and are never logged
//! as server errors; infrastructure failures are logged server-side and
//! surfaced as a generic 500.

use crate::errors::ServiceError;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Response wrapper carrying a message and optional payload
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Human-readable message
    pub message: String,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
        }
    }

    /// Create a data-less message response
    pub fn message(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            message: message.into(),
            data: None,
        }
    }
}

/// Converts ServiceError to the appropriate HTTP response with standard format
pub fn service_error_to_http(error: ServiceError) -> (StatusCode, String) {
    let (status, message) = match error {
        ServiceError::Validation { message } => (StatusCode::BAD_REQUEST, message),
        ServiceError::NotFound { entity, identifier } => (
            StatusCode::NOT_FOUND,
            format!("{} '{}' not found", entity, identifier),
        ),
        ServiceError::DuplicateEmail { .. } => {
            (StatusCode::BAD_REQUEST, "User already exists".to_string())
        }
        ServiceError::InvalidCredentials => {
            (StatusCode::UNAUTHORIZED, "Invalid password".to_string())
        }
        ServiceError::NoPendingReset => {
            (StatusCode::BAD_REQUEST, "No reset request found".to_string())
        }
        ServiceError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token".to_string()),
        ServiceError::Expired => (StatusCode::GONE, "Reset link expired".to_string()),
        ServiceError::Database { source } => {
            tracing::error!("Database error: {}", source);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
        }
        ServiceError::Internal { message } => {
            tracing::error!("Internal error: {}", message);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
        }
    };

    let error_response = ApiResponse::<()>::message(message);
    (status, serde_json::to_string(&error_response).unwrap())
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Object storage error: {0}")]
    ObjectStorage(String),

    #[error("Local store error: {0}")]
    LocalStore(String),

    #[error("Record conversion error: {0}")]
    Conversion(#[from] crate::models::activity::ConversionError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Remote failures that the sync engine logs and swallows.
    pub fn is_network_error(&self) -> bool {
        matches!(self, AppError::Remote(_) | AppError::ObjectStorage(_))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

impl From<crate::persistence::LocalStoreError> for AppError {
    fn from(error: crate::persistence::LocalStoreError) -> Self {
        AppError::LocalStore(error.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Remote(msg) => {
                tracing::warn!(error = %msg, "Remote store error");
                (StatusCode::BAD_GATEWAY, "remote_error", Some(msg.clone()))
            }
            AppError::ObjectStorage(msg) => {
                tracing::warn!(error = %msg, "Object storage error");
                (StatusCode::BAD_GATEWAY, "storage_error", Some(msg.clone()))
            }
            AppError::Conversion(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "conversion_error",
                Some(err.to_string()),
            ),
            AppError::LocalStore(msg) => {
                tracing::error!(error = %msg, "Local store error");
                (StatusCode::INTERNAL_SERVER_ERROR, "local_store_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers and services
pub type Result<T> = std::result::Result<T, AppError>;

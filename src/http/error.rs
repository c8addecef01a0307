//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Number of conflicting reservations, present on 409 responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<usize>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            conflicts: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_conflicts(mut self, conflicts: usize) -> Self {
        self.conflicts = Some(conflicts);
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Invalid request (validation error)
    BadRequest(String),
    /// Resource not found
    NotFound(String),
    /// Internal server error
    Internal(String),
    /// Repository error, mapped by variant
    Repository(RepositoryError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg)),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
            AppError::Repository(e) => map_repository_error(e),
        };

        (status, Json(error)).into_response()
    }
}

fn map_repository_error(err: RepositoryError) -> (StatusCode, ApiError) {
    match err {
        RepositoryError::Validation { message, context } => (
            StatusCode::BAD_REQUEST,
            with_context(ApiError::new("VALIDATION_ERROR", message), context),
        ),
        RepositoryError::NotFound { message, context } => (
            StatusCode::NOT_FOUND,
            with_context(ApiError::new("NOT_FOUND", message), context),
        ),
        RepositoryError::Conflict {
            message,
            conflicts,
            context,
        } => (
            StatusCode::CONFLICT,
            with_context(ApiError::new("CONFLICT", message), context).with_conflicts(conflicts),
        ),
        // Storage-level failures all surface as 500; the full error is
        // logged server-side, clients only see a generic message.
        other => {
            tracing::error!(error = %other, "repository failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("STORAGE_ERROR", "Internal storage error"),
            )
        }
    }
}

fn with_context(error: ApiError, context: crate::db::repository::ErrorContext) -> ApiError {
    if context.is_empty() {
        error
    } else {
        error.with_details(context.to_string())
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

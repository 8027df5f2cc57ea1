//! Error types for RustSocial
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// This enum represents all possible errors that can occur
/// in the application. It implements `IntoResponse` to
/// automatically convert errors to appropriate HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("Not found.")]
    NotFound,

    /// Authentication required (401)
    #[error("Authentication credentials were not provided or are invalid.")]
    Unauthorized,

    /// Caller does not own the object it tries to mutate (403)
    #[error("You do not have permission to perform this action.")]
    Forbidden,

    /// Bad input or domain-rule violation (400)
    #[error("{0}")]
    Validation(String),

    /// Requested page is out of range or unparsable (404)
    #[error("Invalid page.")]
    InvalidPage,

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<JsonRejection> for AppError {
    /// Malformed, mistyped or non-JSON request bodies are client errors
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound | AppError::InvalidPage => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to appropriate HTTP status code
    /// and JSON error body.
    fn into_response(self) -> Response {
        use axum::Json;

        let status = self.status_code();
        let (error_message, error_type) = match &self {
            AppError::NotFound => (self.to_string(), "not_found"),
            AppError::Unauthorized => (self.to_string(), "unauthorized"),
            AppError::Forbidden => (self.to_string(), "forbidden"),
            AppError::Validation(msg) => (msg.clone(), "validation"),
            AppError::InvalidPage => (self.to_string(), "invalid_page"),
            AppError::Database(error) => {
                tracing::error!(%error, "Database error while handling request");
                ("Database error".to_string(), "database")
            }
            AppError::Config(msg) => (msg.clone(), "config"),
            AppError::Internal(error) => {
                tracing::error!(error = %error, "Internal error while handling request");
                ("Internal server error".to_string(), "internal")
            }
        };

        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[error_type]).inc();

        let body = Json(serde_json::json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

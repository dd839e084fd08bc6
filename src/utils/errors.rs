//! Error handling for PantryDesk
//!
//! This module defines the main error type used throughout the application
//! and maps it onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Main error type for PantryDesk
#[derive(Error, Debug)]
pub enum PantryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: i64 },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

/// Result type alias for PantryDesk operations
pub type Result<T> = std::result::Result<T, PantryError>;

impl PantryError {
    pub fn not_found(resource: &'static str, id: i64) -> Self {
        PantryError::NotFound { resource, id }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        PantryError::Forbidden(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        PantryError::BadRequest(message.into())
    }

    /// True for a unique-constraint violation reported by Postgres
    pub fn is_unique_violation(&self) -> bool {
        match self {
            PantryError::Database(sqlx::Error::Database(db_err)) => {
                db_err.code().as_deref() == Some("23505")
            }
            _ => false,
        }
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            PantryError::NotFound { .. } => StatusCode::NOT_FOUND,
            PantryError::Forbidden(_) => StatusCode::FORBIDDEN,
            PantryError::BadRequest(_) => StatusCode::BAD_REQUEST,
            PantryError::Unauthorized(_) | PantryError::Token(_) => StatusCode::UNAUTHORIZED,
            PantryError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine readable error code
    pub fn code(&self) -> &'static str {
        match self {
            PantryError::NotFound { .. } => "NOT_FOUND",
            PantryError::Forbidden(_) => "FORBIDDEN",
            PantryError::BadRequest(_) => "BAD_REQUEST",
            PantryError::Unauthorized(_) | PantryError::Token(_) => "UNAUTHORIZED",
            PantryError::RateLimitExceeded => "RATE_LIMITED",
            _ => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PantryError::Database(_) => ErrorSeverity::Critical,
            PantryError::Migration(_) => ErrorSeverity::Critical,
            PantryError::Config(_) => ErrorSeverity::Critical,
            PantryError::Forbidden(_) => ErrorSeverity::Warning,
            PantryError::Unauthorized(_) | PantryError::Token(_) => ErrorSeverity::Warning,
            PantryError::RateLimitExceeded => ErrorSeverity::Warning,
            PantryError::NotFound { .. } | PantryError::BadRequest(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for PantryError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal failures are logged in full but never echoed to the client
        let message = if status.is_server_error() {
            tracing::error!(error = %self, severity = %self.severity(), "Request failed");
            "Internal server error".to_string()
        } else {
            tracing::debug!(error = %self, "Request rejected");
            self.to_string()
        };

        let body = ErrorBody {
            code: self.code(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

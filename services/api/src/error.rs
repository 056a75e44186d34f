//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, and the mapping of
//! port errors onto HTTP responses.

use crate::config::ConfigError;
use axum::http::StatusCode;
use manga_reader_core::ports::PortError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure while applying schema migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// Maps a port error to the `(status, message)` pair the handlers return.
///
/// Unexpected errors are not echoed to the client; `context` is used instead.
pub fn port_error_response(err: PortError, context: &str) -> (StatusCode, String) {
    match err {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
        PortError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        PortError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
        PortError::Unexpected(_) => (StatusCode::INTERNAL_SERVER_ERROR, context.to_string()),
    }
}

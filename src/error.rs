//! Domain error types for the scan coordinator.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use std::fmt;

use sea_orm::SqlErr;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Optimistic update kept losing to concurrent writers
    #[error("Concurrent update: {0}")]
    ConcurrentUpdate(String),

    /// Session status change rejected by strict transition checking
    #[error("Invalid transition: session status cannot change from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl AppError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::Conflict(_) => "DUPLICATE",
            AppError::ConcurrentUpdate(_) => "CONCURRENT_UPDATE",
            AppError::InvalidTransition { .. } => "INVALID_TRANSITION",
        }
    }

    /// True for errors raised by request validation, before any store access.
    ///
    /// `InvalidTransition` is not one of them: it depends on the stored status.
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::InvalidInput(_))
    }

    /// Map a store error, surfacing unique-constraint violations as conflicts.
    pub fn from_insert(err: sea_orm::DbErr, conflict: impl Into<String>) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(conflict.into()),
            _ => AppError::Database(format!("Failed to insert: {}", err)),
        }
    }
}

/// Error body handed to callers. Database details never leave the process.
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        let message = match err {
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                "An internal database error occurred".to_string()
            }
            _ => err.to_string(),
        };

        ErrorResponse {
            error: err.code().to_string(),
            message,
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}

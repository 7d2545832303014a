// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
///
/// The first three variants are the failures a poll can surface to the
/// autoscaler; the rest belong to the submission and worker paths.
#[derive(Error, Debug)]
pub enum AppError {
    /// Transport failure talking to the queue backend (includes poll timeouts)
    #[error("Queue backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Backend answered with data that does not fit the expected shape
    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    /// Negative concurrency or backlog handed to the estimator
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Execution error: {0}")]
    Execution(#[from] crate::port::ExecutionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error conversion is handled in the infra-sqlite crate
// (orphan rules), mapping onto BackendUnavailable / MalformedResponse

// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid task state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Unknown task state: {0}")]
    UnknownState(String),

    #[error("Invalid queue entry: {0}")]
    InvalidQueueEntry(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;

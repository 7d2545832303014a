// Task Executor Port
// Abstraction for running one claimed task

use crate::domain::Task;
use async_trait::async_trait;
use thiserror::Error;

/// Execution errors (recorded on the task, never retried)
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Unsupported task type: {0}")]
    UnsupportedType(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Task failed: {0}")]
    Failed(String),
}

/// Task Executor trait
///
/// Returns a human-readable output on success.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(&self, task: &Task) -> Result<String, ExecutionError>;
}

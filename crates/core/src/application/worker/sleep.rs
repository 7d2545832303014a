// Sleep Executor - the demo workload

use crate::domain::{SleepInput, Task, TaskType};
use crate::port::{ExecutionError, TaskExecutor};
use async_trait::async_trait;
use std::time::Duration;

/// Runs `sleep` tasks: waits `duration_seconds`, then reports it
pub struct SleepExecutor;

#[async_trait]
impl TaskExecutor for SleepExecutor {
    async fn execute(&self, task: &Task) -> Result<String, ExecutionError> {
        if task.task_type.as_str() != TaskType::SLEEP {
            return Err(ExecutionError::UnsupportedType(
                task.task_type.as_str().to_string(),
            ));
        }

        let input = SleepInput::from_payload(&task.payload)
            .map_err(|e| ExecutionError::InvalidPayload(e.to_string()))?;

        tokio::time::sleep(Duration::from_secs(input.duration_seconds)).await;
        Ok(format!("Slept for {} seconds", input.duration_seconds))
    }
}

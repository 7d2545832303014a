// Submit Use Case

use crate::domain::{SleepInput, Task, TaskType};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, QueueRegistry, TaskRepository, TimeProvider};
use serde::{Deserialize, Serialize};

/// Maximum queue name length
pub const MAX_QUEUE_NAME_LEN: usize = 64;

/// Maximum sleep duration accepted for one task (one day)
pub const MAX_DURATION_SECONDS: i64 = 86_400;

/// Submit request: one sleep task on a named queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub queue: String,
    pub duration_seconds: i64,
}

/// Validate request fields (no backend access)
pub fn validate_request(req: &SubmitRequest) -> Result<()> {
    if req.queue.is_empty() {
        return Err(AppError::Validation("Queue name cannot be empty".into()));
    }
    if req.queue.len() > MAX_QUEUE_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Queue name too long: {} > {}",
            req.queue.len(),
            MAX_QUEUE_NAME_LEN
        )));
    }
    if !req
        .queue
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AppError::Validation(format!(
            "Queue name must be alphanumeric, '_' or '-': {}",
            req.queue
        )));
    }
    if !(0..=MAX_DURATION_SECONDS).contains(&req.duration_seconds) {
        return Err(AppError::Validation(format!(
            "Duration out of range [0, {}]: {}",
            MAX_DURATION_SECONDS, req.duration_seconds
        )));
    }
    Ok(())
}

/// Execute submit use case
///
/// # Arguments
///
/// * `registry` - Queue registry (the queue must exist)
/// * `task_repo` - Task repository
/// * `id_provider` - ID generator (injected for determinism)
/// * `time_provider` - Time provider (injected for determinism)
/// * `req` - Submit request
pub async fn execute(
    registry: &dyn QueueRegistry,
    task_repo: &dyn TaskRepository,
    id_provider: &dyn IdProvider,
    time_provider: &dyn TimeProvider,
    req: SubmitRequest,
) -> Result<Task> {
    validate_request(&req)?;

    if registry.find_queue(&req.queue).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Queue '{}' is not registered",
            req.queue
        )));
    }

    let input = SleepInput {
        duration_seconds: req.duration_seconds as u64,
    };
    let task = Task::new(
        id_provider.generate_id(),
        time_provider.now_millis(),
        req.queue,
        TaskType::sleep(),
        input.to_payload(),
    );

    task_repo.insert(&task).await?;
    Ok(task)
}

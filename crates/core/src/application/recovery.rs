// Startup recovery: tasks orphaned in PENDING by a previous process
use crate::domain::TaskState;
use crate::error::Result;
use crate::port::TaskRepository;
use std::sync::Arc;
use tracing::info;

/// Crash recovery service
///
/// Tasks are only ever PENDING while a worker of this process runs them, so
/// at startup every PENDING task is an orphan and goes back to ENQUEUED.
pub struct RecoveryService {
    task_repo: Arc<dyn TaskRepository>,
}

impl RecoveryService {
    pub fn new(task_repo: Arc<dyn TaskRepository>) -> Self {
        Self { task_repo }
    }

    /// Re-enqueue orphaned tasks. Must run before workers start.
    ///
    /// # Returns
    /// Number of tasks recovered
    pub async fn recover_pending(&self) -> Result<usize> {
        let orphaned = self.task_repo.find_by_state(TaskState::Pending).await?;
        let mut recovered = 0;

        for mut task in orphaned {
            task.requeue()?;
            self.task_repo.update(&task).await?;
            info!(task_id = %task.id, queue = %task.queue, "Orphaned task re-enqueued");
            recovered += 1;
        }

        info!(recovered_count = recovered, "Orphaned task recovery complete");
        Ok(recovered)
    }
}

// Task Submission Service - load generator for the scaling metric

pub mod submit;

pub use submit::SubmitRequest;

use crate::domain::Task;
use crate::error::Result;
use crate::port::{IdProvider, QueueRegistry, TaskRepository, TimeProvider};
use std::sync::Arc;
use tracing::info;

/// Task Submission Service
pub struct TaskSubmissionService {
    registry: Arc<dyn QueueRegistry>,
    task_repo: Arc<dyn TaskRepository>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl TaskSubmissionService {
    pub fn new(
        registry: Arc<dyn QueueRegistry>,
        task_repo: Arc<dyn TaskRepository>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            registry,
            task_repo,
            id_provider,
            time_provider,
        }
    }

    /// Submit one sleep task, returning the stored task
    pub async fn submit(&self, req: SubmitRequest) -> Result<Task> {
        let task = submit::execute(
            self.registry.as_ref(),
            self.task_repo.as_ref(),
            self.id_provider.as_ref(),
            self.time_provider.as_ref(),
            req,
        )
        .await?;

        info!(task_id = %task.id, queue = %task.queue, "Task enqueued");
        Ok(task)
    }
}

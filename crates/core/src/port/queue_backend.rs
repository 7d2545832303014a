// Queue Backend Port (read side)
//
// The only capability the scaling core needs from a task-queue backend.
// Implementations: SqliteQueueBackend (infra-sqlite), InMemoryQueueBackend (mocks).

use crate::domain::{QueueDescriptor, QueueId, TaskId};
use crate::error::Result;
use async_trait::async_trait;

/// A task in a non-terminal state and the queue it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTask {
    pub id: TaskId,
    pub queue: QueueId,
}

/// Read-only queries against the queue backend
///
/// # Errors
/// - `AppError::BackendUnavailable` on transport failure
/// - `AppError::MalformedResponse` when the data cannot be parsed
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// List registered queues with their per-worker concurrency
    async fn list_queues(&self) -> Result<Vec<QueueDescriptor>>;

    /// List tasks currently enqueued or executing, across all queues
    async fn list_active_tasks(&self) -> Result<Vec<ActiveTask>>;
}

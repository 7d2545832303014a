// Task Repository Ports (write side)
//
// Used by submission, workers and startup recovery. The scaling core never
// touches these.

use crate::domain::{QueueDescriptor, Task, TaskId, TaskState};
use crate::error::Result;
use async_trait::async_trait;

/// Queue registration (runtime setup boundary)
#[async_trait]
pub trait QueueRegistry: Send + Sync {
    /// Insert or update a queue's concurrency
    async fn register_queue(&self, queue: &QueueDescriptor) -> Result<()>;

    /// Find a registered queue by name
    async fn find_queue(&self, name: &str) -> Result<Option<QueueDescriptor>>;
}

/// Repository interface for Task persistence
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a new task
    async fn insert(&self, task: &Task) -> Result<()>;

    /// Find task by ID
    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>>;

    /// Persist state, timestamps and result fields
    async fn update(&self, task: &Task) -> Result<()>;

    /// Atomically move the oldest ENQUEUED task of a queue to PENDING
    async fn claim_next(&self, queue: &str) -> Result<Option<Task>>;

    /// Find all tasks in a state (oldest first)
    async fn find_by_state(&self, state: TaskState) -> Result<Vec<Task>>;

    /// Count tasks of a queue in a state
    async fn count_by_state(&self, queue: &str, state: TaskState) -> Result<i64>;
}

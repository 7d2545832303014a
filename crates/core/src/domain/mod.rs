// Domain Layer - Pure business logic and entities

pub mod error;
pub mod queue;
pub mod scaling;
pub mod task;

// Re-exports
pub use error::DomainError;
pub use queue::{QueueDescriptor, QueueId, QueueSnapshot};
pub use scaling::{QueueDemand, ScalingDecision};
pub use task::{SleepInput, Task, TaskId, TaskPayload, TaskState, TaskType};

// Port Layer - Interfaces for external dependencies

pub mod mocks; // In-memory backend for tests
pub mod providers; // Injected ids and clock
pub mod queue_backend;
pub mod task_executor;
pub mod task_repository;

// Re-exports
pub use providers::{IdProvider, SystemTimeProvider, TimeProvider, UuidProvider};
pub use queue_backend::{ActiveTask, QueueBackend};
pub use task_executor::{ExecutionError, TaskExecutor};
pub use task_repository::{QueueRegistry, TaskRepository};

// Application Layer - Use Cases and Business Logic

pub mod recovery;
pub mod scaling;
pub mod submission;
pub mod worker;

// Re-exports
pub use recovery::RecoveryService;
pub use scaling::{estimate, queue_demands, QueueIntrospector, ScalingService};
pub use submission::{SubmitRequest, TaskSubmissionService};
pub use worker::{shutdown_channel, ShutdownSender, ShutdownToken, SleepExecutor, Worker};

// Queuescale Infrastructure - SQLite Adapter
// Implements: QueueBackend (scaling reads), QueueRegistry, TaskRepository

mod connection;
mod error;
mod migration;
mod queue_backend;

pub use connection::create_pool;
pub use error::map_sqlx_error;
pub use migration::run_migrations;
pub use queue_backend::SqliteQueueBackend;

// Note: sqlx::Error conversion goes through map_sqlx_error
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)

//! HTTP Request/Response Types

use serde::{Deserialize, Serialize};

/// GET /metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub expected_workers: u64,
}

/// GET /enqueue/{duration} query string
#[derive(Debug, Default, Deserialize)]
pub struct EnqueueParams {
    pub queue: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueResponse {
    pub message: String,
    pub task_id: String,
    pub queue: String,
    pub duration: i64,
}

/// One row of GET /queues
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSummary {
    pub name: String,
    /// 0 means uncapped
    pub worker_concurrency: i64,
    pub backlog: i64,
    pub demand: u64,
}

/// GET /healthz
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// Scaling Domain Model

use crate::domain::QueueId;
use serde::{Deserialize, Serialize};

/// Output of one estimator run. Never cached, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingDecision {
    /// Always >= 1
    pub expected_workers: u64,
}

impl ScalingDecision {
    /// Floor used when nothing constrains the fleet
    pub const MINIMUM: ScalingDecision = ScalingDecision {
        expected_workers: 1,
    };

    pub fn new(expected_workers: u64) -> Self {
        Self {
            expected_workers: expected_workers.max(1),
        }
    }
}

/// Per-queue breakdown of the replica demand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDemand {
    pub queue: QueueId,
    pub worker_concurrency: i64,
    pub backlog: i64,
    pub demand: u64,
}

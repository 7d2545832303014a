//! Scaling Estimator
//!
//! Pure replica-count policy: the busiest queue, relative to its own
//! per-worker concurrency, sets the fleet size.
//!
//! ```text
//! candidates = { q | concurrency(q) > 0 }
//! demand(q)  = ceil(backlog(q) / concurrency(q))      backlog defaults to 0
//! workers    = max(1, max(demand(q) for q in candidates))
//! ```
//!
//! Uncapped queues (concurrency 0) never influence the result. The maximum,
//! not the sum, is taken because every replica can drain every queue.

use crate::domain::{QueueDemand, QueueId, ScalingDecision};
use crate::error::{AppError, Result};
use std::collections::BTreeMap;

/// Compute the expected worker count for one snapshot.
///
/// # Errors
/// `AppError::InvalidInput` if any concurrency or backlog value is negative.
pub fn estimate(
    concurrency: &BTreeMap<QueueId, i64>,
    backlog: &BTreeMap<QueueId, i64>,
) -> Result<ScalingDecision> {
    let max_demand = queue_demands(concurrency, backlog)?
        .into_iter()
        .map(|d| d.demand)
        .max()
        .unwrap_or(0);

    Ok(ScalingDecision::new(max_demand))
}

/// Per-candidate-queue demand, in queue name order.
///
/// Applies the same validation as [`estimate`].
pub fn queue_demands(
    concurrency: &BTreeMap<QueueId, i64>,
    backlog: &BTreeMap<QueueId, i64>,
) -> Result<Vec<QueueDemand>> {
    validate(concurrency, "concurrency")?;
    validate(backlog, "backlog")?;

    Ok(concurrency
        .iter()
        .filter(|(_, &limit)| limit > 0)
        .map(|(queue, &limit)| {
            let pending = backlog.get(queue).copied().unwrap_or(0);
            QueueDemand {
                queue: queue.clone(),
                worker_concurrency: limit,
                backlog: pending,
                demand: ceil_div(pending as u64, limit as u64),
            }
        })
        .collect())
}

fn validate(values: &BTreeMap<QueueId, i64>, what: &str) -> Result<()> {
    match values.iter().find(|(_, &v)| v < 0) {
        Some((queue, v)) => Err(AppError::InvalidInput(format!(
            "negative {} {} for queue '{}'",
            what, v, queue
        ))),
        None => Ok(()),
    }
}

// divisor > 0; no `a + b - 1` so u64::MAX backlogs cannot overflow
fn ceil_div(dividend: u64, divisor: u64) -> u64 {
    dividend / divisor + u64::from(dividend % divisor != 0)
}

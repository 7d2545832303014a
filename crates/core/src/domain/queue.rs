// Queue Domain Model

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Queue identifier
pub type QueueId = String;

/// A registered queue and its per-worker concurrency cap.
///
/// `None` and `Some(0)` both mean "uncapped". The value stays signed so a
/// corrupted backend row can be rejected by the estimator instead of being
/// silently clamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDescriptor {
    pub name: QueueId,
    pub worker_concurrency: Option<i64>,
}

impl QueueDescriptor {
    pub fn new(name: impl Into<String>, worker_concurrency: Option<i64>) -> Self {
        Self {
            name: name.into(),
            worker_concurrency,
        }
    }

    pub fn capped(name: impl Into<String>, worker_concurrency: i64) -> Self {
        Self::new(name, Some(worker_concurrency))
    }

    pub fn uncapped(name: impl Into<String>) -> Self {
        Self::new(name, None)
    }

    /// Concurrency as seen by the estimator (absent = 0)
    pub fn effective_concurrency(&self) -> i64 {
        self.worker_concurrency.unwrap_or(0)
    }

    pub fn is_capped(&self) -> bool {
        self.effective_concurrency() > 0
    }
}

/// Parses `name` or `name:concurrency` (used by configuration).
impl FromStr for QueueDescriptor {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, concurrency) = match s.split_once(':') {
            Some((name, raw)) => {
                let value: i64 = raw.trim().parse().map_err(|_| {
                    DomainError::InvalidQueueEntry(format!("bad concurrency in '{}'", s))
                })?;
                if value < 0 {
                    return Err(DomainError::InvalidQueueEntry(format!(
                        "negative concurrency in '{}'",
                        s
                    )));
                }
                (name.trim(), Some(value))
            }
            None => (s, None),
        };

        if name.is_empty() {
            return Err(DomainError::InvalidQueueEntry(format!(
                "empty queue name in '{}'",
                s
            )));
        }

        Ok(Self::new(name, concurrency))
    }
}

/// Point-in-time view of the backend, as consumed by the estimator.
///
/// Ordered maps keep validation and iteration deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    /// queue name -> worker concurrency (0 = uncapped)
    pub concurrency: BTreeMap<QueueId, i64>,
    /// queue name -> backlog; queues without active tasks are absent
    pub backlog: BTreeMap<QueueId, i64>,
}

impl QueueSnapshot {
    pub fn new(concurrency: BTreeMap<QueueId, i64>, backlog: BTreeMap<QueueId, i64>) -> Self {
        Self {
            concurrency,
            backlog,
        }
    }

    /// Backlog for a queue, defaulting to 0
    pub fn backlog_of(&self, queue: &str) -> i64 {
        self.backlog.get(queue).copied().unwrap_or(0)
    }
}

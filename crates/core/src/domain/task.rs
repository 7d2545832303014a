// Task Domain Model

use crate::domain::error::{DomainError, Result};
use crate::domain::QueueId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Task ID (UUID v4)
pub type TaskId = String;

/// Task State
///
/// `Enqueued` and `Pending` are the non-terminal states counted as backlog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Enqueued,
    Pending,
    Success,
    Error,
    Cancelled,
}

impl TaskState {
    pub const NON_TERMINAL: [TaskState; 2] = [TaskState::Enqueued, TaskState::Pending];

    pub fn is_terminal(&self) -> bool {
        !Self::NON_TERMINAL.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Enqueued => "ENQUEUED",
            TaskState::Pending => "PENDING",
            TaskState::Success => "SUCCESS",
            TaskState::Error => "ERROR",
            TaskState::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ENQUEUED" => Ok(TaskState::Enqueued),
            "PENDING" => Ok(TaskState::Pending),
            "SUCCESS" => Ok(TaskState::Success),
            "ERROR" => Ok(TaskState::Error),
            "CANCELLED" => Ok(TaskState::Cancelled),
            other => Err(DomainError::UnknownState(other.to_string())),
        }
    }
}

/// Task Type (e.g. "sleep")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskType(String);

impl TaskType {
    pub const SLEEP: &'static str = "sleep";

    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn sleep() -> Self {
        Self::new(Self::SLEEP)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Task Payload (JSON serializable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPayload(serde_json::Value);

impl TaskPayload {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Input of a `sleep` task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepInput {
    pub duration_seconds: u64,
}

impl SleepInput {
    pub fn to_payload(self) -> TaskPayload {
        TaskPayload::new(serde_json::json!({ "duration_seconds": self.duration_seconds }))
    }

    pub fn from_payload(payload: &TaskPayload) -> serde_json::Result<Self> {
        serde_json::from_value(payload.as_value().clone())
    }
}

/// Task Entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub queue: QueueId,
    pub task_type: TaskType,
    pub state: TaskState,
    pub payload: TaskPayload,

    pub created_at: i64, // epoch ms
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,

    pub output: Option<String>,
    pub error: Option<String>,
}

impl Task {
    /// Create a new task in `Enqueued` state
    ///
    /// ID and timestamp are injected (see `IdProvider` / `TimeProvider`).
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        queue: impl Into<String>,
        task_type: TaskType,
        payload: TaskPayload,
    ) -> Self {
        Self {
            id: id.into(),
            queue: queue.into(),
            task_type,
            state: TaskState::Enqueued,
            payload,
            created_at,
            started_at: None,
            finished_at: None,
            output: None,
            error: None,
        }
    }

    /// Create a sleep task with a deterministic ID (for tests only)
    pub fn new_test(queue: impl Into<String>, duration_seconds: u64) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static TEST_COUNTER: AtomicU64 = AtomicU64::new(1);

        let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        Self::new(
            format!("test-{}", counter),
            (counter * 1000) as i64,
            queue,
            TaskType::sleep(),
            SleepInput { duration_seconds }.to_payload(),
        )
    }

    fn transition(&mut self, from: TaskState, to: TaskState) -> Result<()> {
        if self.state != from {
            return Err(DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        self.state = to;
        Ok(())
    }

    /// ENQUEUED -> PENDING
    pub fn start(&mut self, now_millis: i64) -> Result<()> {
        self.transition(TaskState::Enqueued, TaskState::Pending)?;
        self.started_at = Some(now_millis);
        Ok(())
    }

    /// PENDING -> SUCCESS
    pub fn complete(&mut self, now_millis: i64, output: impl Into<String>) -> Result<()> {
        self.transition(TaskState::Pending, TaskState::Success)?;
        self.finished_at = Some(now_millis);
        self.output = Some(output.into());
        Ok(())
    }

    /// PENDING -> ERROR
    pub fn fail(&mut self, now_millis: i64, error: impl Into<String>) -> Result<()> {
        self.transition(TaskState::Pending, TaskState::Error)?;
        self.finished_at = Some(now_millis);
        self.error = Some(error.into());
        Ok(())
    }

    /// PENDING -> ENQUEUED (startup recovery)
    pub fn requeue(&mut self) -> Result<()> {
        self.transition(TaskState::Pending, TaskState::Enqueued)?;
        self.started_at = None;
        Ok(())
    }
}

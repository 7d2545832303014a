// ============================================================================
// Mock Implementations for Testing
// ============================================================================
//
// In-memory stand-ins for the ports. Shared by unit tests in this crate and
// by adapter tests downstream (api-http, integration-tests).

use super::*;
use crate::domain::{QueueDescriptor, Task, TaskId, TaskState};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Failure injected into the read queries
#[derive(Debug, Clone)]
pub enum MockFailure {
    Unavailable(String),
    Malformed(String),
}

impl MockFailure {
    fn to_error(&self) -> AppError {
        match self {
            MockFailure::Unavailable(msg) => AppError::BackendUnavailable(msg.clone()),
            MockFailure::Malformed(msg) => AppError::MalformedResponse(msg.clone()),
        }
    }
}

/// In-memory queue backend implementing every backend port
#[derive(Default)]
pub struct InMemoryQueueBackend {
    queues: Mutex<Vec<QueueDescriptor>>,
    tasks: Mutex<Vec<Task>>,
    failure: Mutex<Option<MockFailure>>,
    delay: Mutex<Option<Duration>>,
    read_calls: AtomicUsize,
}

impl InMemoryQueueBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_queues(queues: Vec<QueueDescriptor>) -> Self {
        let backend = Self::new();
        *backend.queues.lock().unwrap() = queues;
        backend
    }

    /// Add `count` enqueued sleep tasks to a queue
    pub fn push_tasks(&self, queue: &str, count: usize) {
        let mut tasks = self.tasks.lock().unwrap();
        for _ in 0..count {
            tasks.push(Task::new_test(queue, 0));
        }
    }

    pub fn push_task(&self, task: Task) {
        self.tasks.lock().unwrap().push(task);
    }

    pub fn set_failure(&self, failure: Option<MockFailure>) {
        *self.failure.lock().unwrap() = failure;
    }

    /// Delay every read query (for timeout tests)
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Number of read queries served so far
    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.lock().unwrap().clone()
    }

    async fn before_read(&self) -> Result<()> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self.failure.lock().unwrap().clone();
        match failure {
            Some(f) => Err(f.to_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl QueueBackend for InMemoryQueueBackend {
    async fn list_queues(&self) -> Result<Vec<QueueDescriptor>> {
        self.before_read().await?;
        Ok(self.queues.lock().unwrap().clone())
    }

    async fn list_active_tasks(&self) -> Result<Vec<ActiveTask>> {
        self.before_read().await?;
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| !t.state.is_terminal())
            .map(|t| ActiveTask {
                id: t.id.clone(),
                queue: t.queue.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl QueueRegistry for InMemoryQueueBackend {
    async fn register_queue(&self, queue: &QueueDescriptor) -> Result<()> {
        let mut queues = self.queues.lock().unwrap();
        match queues.iter_mut().find(|q| q.name == queue.name) {
            Some(existing) => *existing = queue.clone(),
            None => queues.push(queue.clone()),
        }
        Ok(())
    }

    async fn find_queue(&self, name: &str) -> Result<Option<QueueDescriptor>> {
        Ok(self
            .queues
            .lock()
            .unwrap()
            .iter()
            .find(|q| q.name == name)
            .cloned())
    }
}

#[async_trait]
impl TaskRepository for InMemoryQueueBackend {
    async fn insert(&self, task: &Task) -> Result<()> {
        let mut tasks = self.tasks.lock().unwrap();
        if tasks.iter().any(|t| t.id == task.id) {
            return Err(AppError::InvalidState(format!("Task {} already exists", task.id)));
        }
        tasks.push(task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>> {
        Ok(self.tasks.lock().unwrap().iter().find(|t| &t.id == id).cloned())
    }

    async fn update(&self, task: &Task) -> Result<()> {
        let mut tasks = self.tasks.lock().unwrap();
        match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => {
                *existing = task.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Task {} not found", task.id))),
        }
    }

    async fn claim_next(&self, queue: &str) -> Result<Option<Task>> {
        let mut tasks = self.tasks.lock().unwrap();
        let next = tasks
            .iter_mut()
            .filter(|t| t.queue == queue && t.state == TaskState::Enqueued)
            .min_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));

        match next {
            Some(task) => {
                task.start(SystemTimeProvider.now_millis())?;
                Ok(Some(task.clone()))
            }
            None => Ok(None),
        }
    }

    async fn find_by_state(&self, state: TaskState) -> Result<Vec<Task>> {
        let mut found: Vec<Task> = self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.state == state)
            .cloned()
            .collect();
        found.sort_by_key(|t| t.created_at);
        Ok(found)
    }

    async fn count_by_state(&self, queue: &str, state: TaskState) -> Result<i64> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.queue == queue && t.state == state)
            .count() as i64)
    }
}

/// Ids "task-1", "task-2", ...
#[derive(Default)]
pub struct SequentialIdProvider {
    next: AtomicUsize,
}

impl IdProvider for SequentialIdProvider {
    fn generate_id(&self) -> String {
        format!("task-{}", self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// Clock that advances by one millisecond per read
pub struct SteppingTimeProvider {
    now: AtomicI64,
}

impl SteppingTimeProvider {
    pub fn starting_at(millis: i64) -> Self {
        Self {
            now: AtomicI64::new(millis),
        }
    }
}

impl TimeProvider for SteppingTimeProvider {
    fn now_millis(&self) -> i64 {
        self.now.fetch_add(1, Ordering::SeqCst)
    }
}

/// Executor that succeeds or fails instantly
pub struct MockTaskExecutor {
    fail_with: Option<String>,
    calls: AtomicUsize,
}

impl MockTaskExecutor {
    pub fn new_success() -> Self {
        Self {
            fail_with: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn new_fail(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskExecutor for MockTaskExecutor {
    async fn execute(&self, task: &Task) -> std::result::Result<String, ExecutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(msg) => Err(ExecutionError::Failed(msg.clone())),
            None => Ok(format!("mock executed {}", task.id)),
        }
    }
}

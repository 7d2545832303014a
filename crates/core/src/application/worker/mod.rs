// Worker - drains one queue within its per-worker concurrency

pub mod constants;
mod shutdown;
mod sleep;

use constants::*;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use sleep::SleepExecutor;

use crate::domain::{QueueDescriptor, Task};
use crate::error::Result;
use crate::port::{TaskExecutor, TaskRepository, TimeProvider};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Worker processes tasks from one queue.
///
/// At most `parallelism` tasks run at once: the queue's worker concurrency,
/// or `DEFAULT_UNCAPPED_PARALLELISM` for uncapped queues.
pub struct Worker {
    queue: String,
    parallelism: usize,
    slots: Arc<Semaphore>,
    task_repo: Arc<dyn TaskRepository>,
    task_executor: Arc<dyn TaskExecutor>,
    time_provider: Arc<dyn TimeProvider>,
}

impl Worker {
    pub fn new(
        queue: &QueueDescriptor,
        task_repo: Arc<dyn TaskRepository>,
        task_executor: Arc<dyn TaskExecutor>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        let parallelism = match queue.worker_concurrency {
            Some(n) if n > 0 => (n as usize).min(MAX_PARALLELISM),
            _ => DEFAULT_UNCAPPED_PARALLELISM,
        };

        Self {
            queue: queue.name.clone(),
            parallelism,
            slots: Arc::new(Semaphore::new(parallelism)),
            task_repo,
            task_executor,
            time_provider,
        }
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Run worker loop until shutdown, then wait for in-flight tasks
    pub async fn run(&self, mut shutdown: ShutdownToken) -> Result<()> {
        info!(queue = %self.queue, parallelism = self.parallelism, "Worker started");

        loop {
            if shutdown.is_shutdown() {
                break;
            }

            let permit = tokio::select! {
                permit = Arc::clone(&self.slots).acquire_owned() => match permit {
                    Ok(p) => p,
                    Err(_) => break,
                },
                _ = shutdown.wait() => break,
            };

            match self.task_repo.claim_next(&self.queue).await {
                Ok(Some(task)) => {
                    let task_repo = Arc::clone(&self.task_repo);
                    let task_executor = Arc::clone(&self.task_executor);
                    let time_provider = Arc::clone(&self.time_provider);
                    let token = shutdown.clone();

                    tokio::spawn(async move {
                        let claimed = task.clone();
                        match Self::execute_claimed(task_executor, time_provider, task).await {
                            Ok(finished) => {
                                Self::record_outcome(task_repo.as_ref(), &finished, claimed, token)
                                    .await
                            }
                            Err(e) => {
                                error!(task_id = %claimed.id, error = %e, "Failed to finish task");
                                Self::requeue(task_repo.as_ref(), claimed).await;
                            }
                        }
                        drop(permit);
                    });
                }
                Ok(None) => {
                    drop(permit);
                    tokio::select! {
                        _ = sleep(IDLE_SLEEP_DURATION) => {},
                        _ = shutdown.wait() => break,
                    }
                }
                Err(e) => {
                    drop(permit);
                    error!(queue = %self.queue, error = %e, "Worker error");
                    tokio::select! {
                        _ = sleep(ERROR_RECOVERY_SLEEP_DURATION) => {},
                        _ = shutdown.wait() => break,
                    }
                }
            }
        }

        info!(queue = %self.queue, "Worker draining in-flight tasks");
        let _ = self.slots.acquire_many(self.parallelism as u32).await;
        info!(queue = %self.queue, "Worker stopped");
        Ok(())
    }

    /// Claim and run one task inline (returns true if a task was processed).
    /// If the outcome cannot be recorded the task is re-enqueued and the error returned.
    pub async fn process_next_task(&self) -> Result<bool> {
        let task = match self.task_repo.claim_next(&self.queue).await? {
            Some(t) => t,
            None => return Ok(false),
        };

        let claimed = task.clone();
        let recorded = match Self::execute_claimed(
            Arc::clone(&self.task_executor),
            Arc::clone(&self.time_provider),
            task,
        )
        .await
        {
            Ok(finished) => self.task_repo.update(&finished).await,
            Err(e) => Err(e),
        };

        if let Err(e) = recorded {
            Self::requeue(self.task_repo.as_ref(), claimed).await;
            return Err(e);
        }
        Ok(true)
    }

    /// Execute a PENDING task on its own tokio task and return it in its terminal state.
    /// A panic inside the executor fails the task, not the worker.
    async fn execute_claimed(
        task_executor: Arc<dyn TaskExecutor>,
        time_provider: Arc<dyn TimeProvider>,
        task: Task,
    ) -> Result<Task> {
        info!(task_id = %task.id, task_type = task.task_type.as_str(), "Executing task");

        let task = Arc::new(task);
        let task_for_exec = Arc::clone(&task);
        let handle = tokio::spawn(async move { task_executor.execute(&task_for_exec).await });
        let outcome = handle.await;

        let mut task = Arc::try_unwrap(task).unwrap_or_else(|arc| (*arc).clone());
        let now = time_provider.now_millis();

        match outcome {
            Ok(Ok(output)) => {
                task.complete(now, output)?;
                info!(task_id = %task.id, "Task completed");
            }
            Ok(Err(e)) => {
                warn!(task_id = %task.id, error = %e, "Task failed");
                task.fail(now, e.to_string())?;
            }
            Err(join_err) => {
                let reason = if join_err.is_panic() {
                    "task panicked"
                } else {
                    "task cancelled"
                };
                error!(task_id = %task.id, "Task aborted: {}", reason);
                task.fail(now, reason)?;
            }
        }

        Ok(task)
    }

    /// Persist a finished task, retrying until it sticks or shutdown is requested.
    /// A task that still cannot be recorded at shutdown goes back to ENQUEUED.
    async fn record_outcome(
        task_repo: &dyn TaskRepository,
        finished: &Task,
        claimed: Task,
        mut shutdown: ShutdownToken,
    ) {
        loop {
            let e = match task_repo.update(finished).await {
                Ok(()) => return,
                Err(e) => e,
            };
            warn!(task_id = %finished.id, error = %e, "Failed to record task result, retrying");

            if shutdown.is_shutdown() {
                break;
            }
            tokio::select! {
                _ = sleep(ERROR_RECOVERY_SLEEP_DURATION) => {},
                _ = shutdown.wait() => break,
            }
        }

        Self::requeue(task_repo, claimed).await;
    }

    /// Best-effort PENDING -> ENQUEUED so the task is picked up again.
    /// If this fails too, startup recovery re-enqueues it.
    async fn requeue(task_repo: &dyn TaskRepository, mut claimed: Task) {
        if let Err(e) = claimed.requeue() {
            error!(task_id = %claimed.id, error = %e, "Cannot requeue task");
            return;
        }
        match task_repo.update(&claimed).await {
            Ok(()) => warn!(task_id = %claimed.id, "Task re-enqueued after failed result write"),
            Err(e) => {
                error!(task_id = %claimed.id, error = %e, "Failed to requeue task, left PENDING")
            }
        }
    }
}

//! Queue Introspector
//!
//! Turns the two backend queries into the snapshot the estimator consumes.

use crate::domain::{QueueId, QueueSnapshot};
use crate::error::{AppError, Result};
use crate::port::QueueBackend;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Reads queue configuration and backlog from a [`QueueBackend`]
#[derive(Clone)]
pub struct QueueIntrospector {
    backend: Arc<dyn QueueBackend>,
}

impl QueueIntrospector {
    pub fn new(backend: Arc<dyn QueueBackend>) -> Self {
        Self { backend }
    }

    /// Fetch concurrency and backlog mappings.
    ///
    /// Both queries run concurrently; the first failure fails the fetch.
    /// No retries.
    pub async fn fetch_queue_state(&self) -> Result<QueueSnapshot> {
        let (queues, active) = tokio::try_join!(
            self.backend.list_queues(),
            self.backend.list_active_tasks()
        )?;

        let mut concurrency: BTreeMap<QueueId, i64> = BTreeMap::new();
        for queue in queues {
            if queue.name.is_empty() {
                return Err(AppError::MalformedResponse(
                    "queue with empty name".to_string(),
                ));
            }
            let limit = queue.effective_concurrency();
            if concurrency.insert(queue.name.clone(), limit).is_some() {
                return Err(AppError::MalformedResponse(format!(
                    "queue '{}' listed more than once",
                    queue.name
                )));
            }
        }

        let mut backlog: BTreeMap<QueueId, i64> = BTreeMap::new();
        for task in active {
            *backlog.entry(task.queue).or_insert(0) += 1;
        }

        debug!(
            queues = concurrency.len(),
            active_queues = backlog.len(),
            "Fetched queue state"
        );

        Ok(QueueSnapshot::new(concurrency, backlog))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{QueueDescriptor, Task, TaskState};
    use crate::port::mocks::{InMemoryQueueBackend, MockFailure};

    #[tokio::test]
    async fn test_counts_active_tasks_by_queue() {
        let backend = Arc::new(InMemoryQueueBackend::with_queues(vec![
            QueueDescriptor::capped("a", 2),
            QueueDescriptor::uncapped("b"),
            QueueDescriptor::capped("idle", 1),
        ]));
        backend.push_tasks("a", 3);
        backend.push_tasks("b", 1);

        let snapshot = QueueIntrospector::new(backend)
            .fetch_queue_state()
            .await
            .unwrap();

        assert_eq!(snapshot.concurrency.get("a"), Some(&2));
        assert_eq!(snapshot.concurrency.get("b"), Some(&0));
        assert_eq!(snapshot.concurrency.get("idle"), Some(&1));
        assert_eq!(snapshot.backlog.get("a"), Some(&3));
        assert_eq!(snapshot.backlog.get("b"), Some(&1));
        // no active tasks -> absent, not zero
        assert!(!snapshot.backlog.contains_key("idle"));
    }

    #[tokio::test]
    async fn test_terminal_tasks_are_not_backlog() {
        let backend = Arc::new(InMemoryQueueBackend::with_queues(vec![
            QueueDescriptor::capped("a", 1),
        ]));

        let mut running = Task::new_test("a", 0);
        running.start(1).unwrap();
        let mut done = Task::new_test("a", 0);
        done.start(1).unwrap();
        done.complete(2, "ok").unwrap();
        let mut failed = Task::new_test("a", 0);
        failed.start(1).unwrap();
        failed.fail(2, "boom").unwrap();
        let mut cancelled = Task::new_test("a", 0);
        cancelled.state = TaskState::Cancelled;

        backend.push_tasks("a", 1);
        for task in [running, done, failed, cancelled] {
            backend.push_task(task);
        }

        let snapshot = QueueIntrospector::new(backend)
            .fetch_queue_state()
            .await
            .unwrap();
        assert_eq!(snapshot.backlog_of("a"), 2);
    }

    #[tokio::test]
    async fn test_tasks_of_unregistered_queues_are_still_counted() {
        let backend = Arc::new(InMemoryQueueBackend::new());
        backend.push_tasks("ghost", 4);

        let snapshot = QueueIntrospector::new(backend)
            .fetch_queue_state()
            .await
            .unwrap();
        assert!(snapshot.concurrency.is_empty());
        assert_eq!(snapshot.backlog_of("ghost"), 4);
    }

    #[tokio::test]
    async fn test_negative_concurrency_passes_through_unchanged() {
        let backend = Arc::new(InMemoryQueueBackend::with_queues(vec![
            QueueDescriptor::capped("bad", -3),
        ]));

        let snapshot = QueueIntrospector::new(backend)
            .fetch_queue_state()
            .await
            .unwrap();
        assert_eq!(snapshot.concurrency.get("bad"), Some(&-3));
    }

    #[tokio::test]
    async fn test_duplicate_queue_is_malformed() {
        let backend = Arc::new(InMemoryQueueBackend::with_queues(vec![
            QueueDescriptor::capped("a", 1),
            QueueDescriptor::capped("a", 2),
        ]));

        let err = QueueIntrospector::new(backend)
            .fetch_queue_state()
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_empty_queue_name_is_malformed() {
        let backend = Arc::new(InMemoryQueueBackend::with_queues(vec![
            QueueDescriptor::capped("", 1),
        ]));

        let err = QueueIntrospector::new(backend)
            .fetch_queue_state()
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_backend_failures_surface_unchanged() {
        let backend = Arc::new(InMemoryQueueBackend::new());
        let introspector = QueueIntrospector::new(backend.clone());

        backend.set_failure(Some(MockFailure::Unavailable("connection refused".into())));
        let err = introspector.fetch_queue_state().await.unwrap_err();
        assert!(matches!(err, AppError::BackendUnavailable(_)));

        backend.set_failure(Some(MockFailure::Malformed("bad row".into())));
        let err = introspector.fetch_queue_state().await.unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));

        // next fetch is unaffected by previous failures
        backend.set_failure(None);
        assert!(introspector.fetch_queue_state().await.is_ok());
    }
}

// Scaling Service - one poll = introspect + estimate

pub mod estimator;
pub mod introspector;

pub use estimator::{estimate, queue_demands};
pub use introspector::QueueIntrospector;

use crate::domain::{QueueDemand, QueueId, QueueSnapshot, ScalingDecision};
use crate::error::{AppError, Result};
use crate::port::QueueBackend;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default bound on one poll's backend round-trips
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Stateless poll entry point shared by all request handlers.
///
/// Concurrent polls do not coordinate: each fetches its own snapshot.
pub struct ScalingService {
    introspector: QueueIntrospector,
    poll_timeout: Duration,
}

impl ScalingService {
    pub fn new(backend: Arc<dyn QueueBackend>, poll_timeout: Duration) -> Self {
        Self {
            introspector: QueueIntrospector::new(backend),
            poll_timeout,
        }
    }

    /// Fetch a fresh snapshot, bounded by the poll timeout
    pub async fn snapshot(&self) -> Result<QueueSnapshot> {
        match tokio::time::timeout(self.poll_timeout, self.introspector.fetch_queue_state()).await
        {
            Ok(result) => result,
            Err(_) => Err(AppError::BackendUnavailable(format!(
                "queue backend timed out after {} ms",
                self.poll_timeout.as_millis()
            ))),
        }
    }

    /// Run one poll and return the expected worker count
    pub async fn poll(&self) -> Result<ScalingDecision> {
        let result = self
            .snapshot()
            .await
            .and_then(|s| estimate(&s.concurrency, &s.backlog));

        match &result {
            Ok(decision) => debug!(
                expected_workers = decision.expected_workers,
                "Scaling poll completed"
            ),
            Err(e) => warn!(error = %e, "Scaling poll failed"),
        }
        result
    }

    /// Per-queue breakdown of a fresh snapshot, one row per registered queue.
    /// Queues that do not constrain the fleet (uncapped) report demand 0.
    pub async fn overview(&self) -> Result<Vec<QueueDemand>> {
        let snapshot = self.snapshot().await?;
        let mut demands: BTreeMap<QueueId, QueueDemand> =
            queue_demands(&snapshot.concurrency, &snapshot.backlog)?
                .into_iter()
                .map(|d| (d.queue.clone(), d))
                .collect();

        Ok(snapshot
            .concurrency
            .iter()
            .map(|(name, &worker_concurrency)| {
                demands.remove(name).unwrap_or_else(|| QueueDemand {
                    queue: name.clone(),
                    worker_concurrency,
                    backlog: snapshot.backlog_of(name),
                    demand: 0,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QueueDescriptor;
    use crate::port::mocks::{InMemoryQueueBackend, MockFailure};

    fn service(backend: Arc<InMemoryQueueBackend>) -> ScalingService {
        ScalingService::new(backend, DEFAULT_POLL_TIMEOUT)
    }

    #[tokio::test]
    async fn test_poll_uses_worst_queue() {
        let backend = Arc::new(InMemoryQueueBackend::with_queues(vec![
            QueueDescriptor::capped("q1", 2),
            QueueDescriptor::capped("q2", 5),
            QueueDescriptor::uncapped("bulk"),
        ]));
        backend.push_tasks("q1", 10);
        backend.push_tasks("q2", 5);
        backend.push_tasks("bulk", 1000);

        let decision = service(backend).poll().await.unwrap();
        assert_eq!(decision.expected_workers, 5);
    }

    #[tokio::test]
    async fn test_poll_without_queues_is_one() {
        let backend = Arc::new(InMemoryQueueBackend::new());
        assert_eq!(
            service(backend).poll().await.unwrap(),
            ScalingDecision::MINIMUM
        );
    }

    #[tokio::test]
    async fn test_poll_rejects_negative_concurrency() {
        let backend = Arc::new(InMemoryQueueBackend::with_queues(vec![
            QueueDescriptor::capped("q", -1),
        ]));
        let err = service(backend).poll().await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_poll_surfaces_backend_failure() {
        let backend = Arc::new(InMemoryQueueBackend::new());
        backend.set_failure(Some(MockFailure::Unavailable("down".into())));
        let err = service(backend).poll().await.unwrap_err();
        assert!(matches!(err, AppError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_poll_times_out_on_stalled_backend() {
        let backend = Arc::new(InMemoryQueueBackend::new());
        backend.set_delay(Some(Duration::from_secs(60)));
        let service = ScalingService::new(backend, Duration::from_millis(20));

        let err = service.poll().await.unwrap_err();
        assert!(matches!(err, AppError::BackendUnavailable(_)));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_concurrent_polls_fetch_independently() {
        let backend = Arc::new(InMemoryQueueBackend::with_queues(vec![
            QueueDescriptor::capped("q", 1),
        ]));
        backend.push_tasks("q", 3);
        let service = Arc::new(service(backend.clone()));

        let (a, b) = tokio::join!(service.poll(), service.poll());
        assert_eq!(a.unwrap().expected_workers, 3);
        assert_eq!(b.unwrap().expected_workers, 3);
        // two queries per poll, no sharing
        assert_eq!(backend.read_calls(), 4);
    }

    #[tokio::test]
    async fn test_overview_lists_every_queue() {
        let backend = Arc::new(InMemoryQueueBackend::with_queues(vec![
            QueueDescriptor::capped("a", 3),
            QueueDescriptor::uncapped("b"),
            QueueDescriptor::capped("c", 2),
        ]));
        backend.push_tasks("a", 10);
        backend.push_tasks("b", 7);

        let rows = service(backend).overview().await.unwrap();
        let view: Vec<(&str, i64, i64, u64)> = rows
            .iter()
            .map(|r| (r.queue.as_str(), r.worker_concurrency, r.backlog, r.demand))
            .collect();
        assert_eq!(view, vec![("a", 3, 10, 4), ("b", 0, 7, 0), ("c", 2, 0, 0)]);
    }

    #[tokio::test]
    async fn test_overview_rejects_negative_concurrency() {
        let backend = Arc::new(InMemoryQueueBackend::with_queues(vec![
            QueueDescriptor::capped("q", -2),
        ]));
        let err = service(backend).overview().await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}

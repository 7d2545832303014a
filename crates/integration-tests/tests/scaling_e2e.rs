//! End-to-end scaling over the SQLite backend
//!
//! Submit -> introspect -> estimate -> drain, with real persistence.

use std::sync::Arc;
use std::time::Duration;

use queuescale_core::application::scaling::DEFAULT_POLL_TIMEOUT;
use queuescale_core::application::{
    RecoveryService, ScalingService, SleepExecutor, SubmitRequest, TaskSubmissionService, Worker,
};
use queuescale_core::domain::{QueueDescriptor, TaskState};
use queuescale_core::port::{QueueRegistry, SystemTimeProvider, TaskRepository, UuidProvider};
use queuescale_infra_sqlite::{create_pool, run_migrations, SqliteQueueBackend};

struct Harness {
    backend: Arc<SqliteQueueBackend>,
    scaling: ScalingService,
    submission: TaskSubmissionService,
}

async fn harness(database_url: &str, queues: &[QueueDescriptor]) -> Harness {
    let pool = create_pool(database_url).await.unwrap();
    run_migrations(&pool).await.unwrap();

    let backend = Arc::new(SqliteQueueBackend::new(pool, Arc::new(SystemTimeProvider)));
    for queue in queues {
        backend.register_queue(queue).await.unwrap();
    }

    Harness {
        scaling: ScalingService::new(backend.clone(), DEFAULT_POLL_TIMEOUT),
        submission: TaskSubmissionService::new(
            backend.clone(),
            backend.clone(),
            Arc::new(UuidProvider),
            Arc::new(SystemTimeProvider),
        ),
        backend,
    }
}

async fn submit_many(h: &Harness, queue: &str, count: usize) {
    for _ in 0..count {
        h.submission
            .submit(SubmitRequest {
                queue: queue.to_string(),
                duration_seconds: 0,
            })
            .await
            .unwrap();
    }
}

fn worker(h: &Harness, queue: &QueueDescriptor) -> Worker {
    Worker::new(
        queue,
        h.backend.clone(),
        Arc::new(SleepExecutor),
        Arc::new(SystemTimeProvider),
    )
}

/// 10 tasks on a concurrency-1 queue need 10 workers; a drained queue needs 1
#[tokio::test]
async fn test_backlog_scales_then_drains_to_floor() {
    let queue1 = QueueDescriptor::capped("queue1", 1);
    let h = harness("sqlite::memory:", &[queue1.clone()]).await;

    assert_eq!(h.scaling.poll().await.unwrap().expected_workers, 1);

    submit_many(&h, "queue1", 10).await;
    assert_eq!(h.scaling.poll().await.unwrap().expected_workers, 10);

    let w = worker(&h, &queue1);
    for remaining in (0..10).rev() {
        assert!(w.process_next_task().await.unwrap());
        assert_eq!(
            h.scaling.poll().await.unwrap().expected_workers,
            remaining.max(1)
        );
    }
    assert!(!w.process_next_task().await.unwrap());

    let done = h.backend.find_by_state(TaskState::Success).await.unwrap();
    assert_eq!(done.len(), 10);
    assert!(done
        .iter()
        .all(|t| t.output.as_deref() == Some("Slept for 0 seconds")));
}

/// The busiest queue relative to its own concurrency sets the fleet size
#[tokio::test]
async fn test_max_over_queues_ignores_uncapped() {
    let h = harness(
        "sqlite::memory:",
        &[
            QueueDescriptor::capped("fast", 4),
            QueueDescriptor::capped("slow", 2),
            QueueDescriptor::uncapped("bulk"),
        ],
    )
    .await;

    submit_many(&h, "fast", 9).await; // ceil(9/4) = 3
    submit_many(&h, "slow", 5).await; // ceil(5/2) = 3
    submit_many(&h, "bulk", 50).await;
    assert_eq!(h.scaling.poll().await.unwrap().expected_workers, 3);

    submit_many(&h, "slow", 2).await; // ceil(7/2) = 4
    assert_eq!(h.scaling.poll().await.unwrap().expected_workers, 4);

    let rows = h.scaling.overview().await.unwrap();
    let demands: Vec<(&str, u64)> = rows.iter().map(|r| (r.queue.as_str(), r.demand)).collect();
    assert_eq!(demands, vec![("bulk", 0), ("fast", 3), ("slow", 4)]);
}

/// Running (PENDING) tasks still count toward the backlog
#[tokio::test]
async fn test_in_flight_tasks_count() {
    let h = harness("sqlite::memory:", &[QueueDescriptor::capped("queue1", 1)]).await;
    submit_many(&h, "queue1", 3).await;

    let claimed = h.backend.claim_next("queue1").await.unwrap().unwrap();
    assert_eq!(claimed.state, TaskState::Pending);
    assert_eq!(h.scaling.poll().await.unwrap().expected_workers, 3);
}

/// The background worker loop drains the queue and stops on shutdown
#[tokio::test]
async fn test_worker_loop_drains_sqlite_queue() {
    let queue = QueueDescriptor::capped("queue1", 3);
    let h = harness("sqlite::memory:", &[queue.clone()]).await;
    submit_many(&h, "queue1", 6).await;

    let (tx, token) = queuescale_core::application::shutdown_channel();
    let w = worker(&h, &queue);
    let handle = tokio::spawn(async move { w.run(token).await });

    let drained = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if h.scaling.poll().await.unwrap().expected_workers == 1
                && h.backend
                    .count_by_state("queue1", TaskState::Success)
                    .await
                    .unwrap()
                    == 6
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(drained.is_ok(), "queue was not drained");

    tx.shutdown();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker did not stop")
        .unwrap()
        .unwrap();
}

/// Backlog survives a restart; orphaned PENDING tasks are re-enqueued
#[tokio::test]
async fn test_restart_keeps_backlog_and_recovers_pending() {
    let db_path = std::env::temp_dir().join(format!(
        "queuescale_restart_{}.db",
        std::process::id()
    ));
    remove_db(&db_path);
    let url = db_path.to_string_lossy().to_string();
    let queues = [QueueDescriptor::capped("queue1", 2)];

    {
        let h = harness(&url, &queues).await;
        submit_many(&h, "queue1", 5).await;
        h.backend.claim_next("queue1").await.unwrap();
        // process "crashes" with one task in flight
    }

    let h = harness(&url, &queues).await;
    assert_eq!(h.scaling.poll().await.unwrap().expected_workers, 3);

    let recovered = RecoveryService::new(h.backend.clone())
        .recover_pending()
        .await
        .unwrap();
    assert_eq!(recovered, 1);
    assert_eq!(
        h.backend
            .count_by_state("queue1", TaskState::Enqueued)
            .await
            .unwrap(),
        5
    );
    assert_eq!(h.scaling.poll().await.unwrap().expected_workers, 3);

    drop(h);
    remove_db(&db_path);
}

fn remove_db(path: &std::path::Path) {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.as_os_str().to_owned();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}

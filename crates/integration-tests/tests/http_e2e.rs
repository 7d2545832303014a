//! HTTP surface over the SQLite backend

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use queuescale_api_http::{build_router, ApiState};
use queuescale_core::application::scaling::DEFAULT_POLL_TIMEOUT;
use queuescale_core::application::{ScalingService, TaskSubmissionService};
use queuescale_core::domain::QueueDescriptor;
use queuescale_core::port::{QueueRegistry, SystemTimeProvider, UuidProvider};
use queuescale_infra_sqlite::{create_pool, run_migrations, SqliteQueueBackend};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

async fn app(queues: &[QueueDescriptor]) -> (Router, SqlitePool) {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();

    let backend = Arc::new(SqliteQueueBackend::new(
        pool.clone(),
        Arc::new(SystemTimeProvider),
    ));
    for queue in queues {
        backend.register_queue(queue).await.unwrap();
    }

    let state = ApiState::new(
        Arc::new(ScalingService::new(backend.clone(), DEFAULT_POLL_TIMEOUT)),
        Arc::new(TaskSubmissionService::new(
            backend.clone(),
            backend,
            Arc::new(UuidProvider),
            Arc::new(SystemTimeProvider),
        )),
        "queue1",
    );
    (build_router(state), pool)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_enqueue_drives_metric() {
    let (app, _pool) = app(&[QueueDescriptor::capped("queue1", 1)]).await;

    let (status, body) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expected_workers"], 1);

    for _ in 0..10 {
        let (status, body) = get(&app, "/enqueue/30").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["queue"], "queue1");
        assert_eq!(body["duration"], 30);
        assert!(body["task_id"].as_str().is_some_and(|id| !id.is_empty()));
    }

    let (status, body) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expected_workers"], 10);
}

#[tokio::test]
async fn test_queues_lists_breakdown() {
    let (app, _pool) = app(&[
        QueueDescriptor::capped("queue1", 2),
        QueueDescriptor::uncapped("bulk"),
    ])
    .await;

    for _ in 0..3 {
        get(&app, "/enqueue/1").await;
    }
    get(&app, "/enqueue/1?queue=bulk").await;

    let (status, body) = get(&app, "/queues").await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "bulk");
    assert_eq!(rows[0]["backlog"], 1);
    assert_eq!(rows[0]["demand"], 0);
    assert_eq!(rows[1]["name"], "queue1");
    assert_eq!(rows[1]["worker_concurrency"], 2);
    assert_eq!(rows[1]["backlog"], 3);
    assert_eq!(rows[1]["demand"], 2);
}

#[tokio::test]
async fn test_enqueue_errors() {
    let (app, _pool) = app(&[QueueDescriptor::capped("queue1", 1)]).await;

    let (status, body) = get(&app, "/enqueue/soon").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("soon"));

    let (status, _) = get(&app, "/enqueue/100000").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/enqueue/1?queue=bad%20name").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/enqueue/1?queue=missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = get(&app, "/metrics").await;
    assert_eq!(body["expected_workers"], 1);
}

#[tokio::test]
async fn test_metrics_backend_down() {
    let (app, pool) = app(&[QueueDescriptor::capped("queue1", 1)]).await;
    pool.close().await;

    let (status, body) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());

    let (status, _) = get(&app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_negative_concurrency_in_store() {
    let (app, pool) = app(&[QueueDescriptor::capped("queue1", 1)]).await;
    sqlx::query(
        "INSERT INTO queues (name, worker_concurrency, created_at, updated_at) VALUES ('broken', -3, 0, 0)",
    )
    .execute(&pool)
    .await
    .unwrap();

    let (status, body) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("broken"));
}

#[tokio::test]
async fn test_metrics_undecodable_store_row() {
    let (app, pool) = app(&[QueueDescriptor::capped("queue1", 1)]).await;
    sqlx::query(
        "INSERT INTO queues (name, worker_concurrency, created_at, updated_at) VALUES ('garbled', 'abc', 0, 0)",
    )
    .execute(&pool)
    .await
    .unwrap();

    let (status, body) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());

    let (status, _) = get(&app, "/queues").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

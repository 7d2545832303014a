//! HTTP Handlers
//!
//! Each handler delegates to a core service and returns JSON.

use crate::error::ApiError;
use crate::types::{EnqueueParams, EnqueueResponse, HealthResponse, MetricsResponse, QueueSummary};
use axum::extract::{Path, Query, State};
use axum::Json;
use queuescale_core::application::{ScalingService, SubmitRequest, TaskSubmissionService};
use queuescale_core::error::AppError;
use std::sync::Arc;
use std::time::Instant;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub scaling: Arc<ScalingService>,
    pub submission: Arc<TaskSubmissionService>,
    /// Queue used by `/enqueue` when `?queue=` is absent
    pub default_queue: String,
    pub start_time: Instant,
}

impl ApiState {
    pub fn new(
        scaling: Arc<ScalingService>,
        submission: Arc<TaskSubmissionService>,
        default_queue: impl Into<String>,
    ) -> Self {
        Self {
            scaling,
            submission,
            default_queue: default_queue.into(),
            start_time: Instant::now(),
        }
    }
}

/// GET /metrics
///
/// One fresh poll per request; nothing is cached between scrapes.
pub async fn metrics(State(state): State<ApiState>) -> Result<Json<MetricsResponse>, ApiError> {
    let decision = state.scaling.poll().await?;
    Ok(Json(MetricsResponse {
        expected_workers: decision.expected_workers,
    }))
}

/// GET /enqueue/{duration}
pub async fn enqueue(
    State(state): State<ApiState>,
    Path(duration): Path<String>,
    Query(params): Query<EnqueueParams>,
) -> Result<Json<EnqueueResponse>, ApiError> {
    let duration_seconds: i64 = duration
        .parse()
        .map_err(|_| AppError::Validation(format!("Invalid duration: '{}'", duration)))?;

    let queue = params
        .queue
        .unwrap_or_else(|| state.default_queue.clone());

    let task = state
        .submission
        .submit(SubmitRequest {
            queue,
            duration_seconds,
        })
        .await?;

    Ok(Json(EnqueueResponse {
        message: format!("Enqueued {}s sleep task", duration_seconds),
        task_id: task.id,
        queue: task.queue,
        duration: duration_seconds,
    }))
}

/// GET /queues
///
/// Every registered queue; uncapped queues report concurrency 0 and demand 0.
pub async fn list_queues(
    State(state): State<ApiState>,
) -> Result<Json<Vec<QueueSummary>>, ApiError> {
    let summaries = state
        .scaling
        .overview()
        .await?
        .into_iter()
        .map(|row| QueueSummary {
            name: row.queue,
            worker_concurrency: row.worker_concurrency,
            backlog: row.backlog,
            demand: row.demand,
        })
        .collect();

    Ok(Json(summaries))
}

/// GET /healthz
pub async fn healthz(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: queuescale_core::VERSION.to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

//! HTTP API Layer
//!
//! Pull-based scaling metric for an external autoscaler, plus the demo
//! task-submission endpoint that generates backlog.
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/metrics` | Expected worker count for the current backlog |
//! | GET | `/enqueue/{duration}?queue=name` | Enqueue one sleep task |
//! | GET | `/queues` | Per-queue concurrency, backlog and demand |
//! | GET | `/healthz` | Liveness and uptime |

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use handler::ApiState;
pub use server::{HttpServer, HttpServerConfig, HttpServerHandle};

use axum::routing::get;
use axum::Router;

/// Build the complete API router
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/metrics", get(handler::metrics))
        .route("/enqueue/{duration}", get(handler::enqueue))
        .route("/queues", get(handler::list_queues))
        .route("/healthz", get(handler::healthz))
        .with_state(state)
}

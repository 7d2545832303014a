//! Queuescale Daemon - Main Entry Point
//! Scaling metric endpoint + demo enqueue + one worker per queue

mod settings;

use crate::settings::{LogFormat, Settings};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use queuescale_api_http::{ApiState, HttpServer, HttpServerConfig};
use queuescale_core::application::worker::constants::GRACEFUL_SHUTDOWN_TIMEOUT;
use queuescale_core::application::{
    shutdown_channel, RecoveryService, ScalingService, SleepExecutor, TaskSubmissionService, Worker,
};
use queuescale_core::port::{QueueRegistry, SystemTimeProvider, UuidProvider};
use queuescale_infra_sqlite::{create_pool, run_migrations, SqliteQueueBackend};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn init_logging(format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("queuescale=info"))?;

    match format {
        // Production: JSON structured logging
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .try_init()?,
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty())
            .try_init()?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Configuration, then logging
    let settings = Settings::load()?;
    init_logging(settings.log_format)?;

    info!("Queuescale v{} starting...", VERSION);
    info!(db_path = %settings.db_path, "Initializing database...");

    // 2. Database
    if !settings.db_path.contains(":memory:") {
        if let Some(parent) = Path::new(&settings.db_path).parent() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let pool = create_pool(&settings.db_path)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 3. DI wiring
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let backend = Arc::new(SqliteQueueBackend::new(pool.clone(), time_provider.clone()));

    for queue in &settings.queues {
        backend
            .register_queue(queue)
            .await
            .map_err(|e| anyhow::anyhow!("Queue registration failed: {}", e))?;
        info!(
            queue = %queue.name,
            worker_concurrency = queue.effective_concurrency(),
            "Queue registered"
        );
    }

    // 4. Crash recovery (before any worker claims)
    info!("Running crash recovery...");
    match RecoveryService::new(backend.clone()).recover_pending().await {
        Ok(count) => info!(recovered_tasks = count, "Crash recovery completed"),
        Err(e) => error!(error = ?e, "Crash recovery failed"),
    }

    // 5. HTTP server
    let scaling = Arc::new(ScalingService::new(backend.clone(), settings.poll_timeout));
    let submission = Arc::new(TaskSubmissionService::new(
        backend.clone(),
        backend.clone(),
        id_provider,
        time_provider.clone(),
    ));
    let http_config = HttpServerConfig {
        host: settings.http_host.clone(),
        port: settings.http_port,
    };
    let http_handle = HttpServer::new(
        http_config,
        ApiState::new(scaling, submission, settings.default_queue.clone()),
    )
    .start()
    .await
    .map_err(|e| anyhow::anyhow!("HTTP server start failed: {}", e))?;

    // 6. Workers, one per queue
    info!("Starting workers...");
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let executor = Arc::new(SleepExecutor);

    let worker_handles: Vec<_> = settings
        .queues
        .iter()
        .map(|queue| {
            let worker = Worker::new(queue, backend.clone(), executor.clone(), time_provider.clone());
            let token = shutdown_rx.clone();
            let name = queue.name.clone();
            tokio::spawn(async move {
                if let Err(e) = worker.run(token).await {
                    error!(queue = %name, error = ?e, "Worker failed");
                }
            })
        })
        .collect();

    info!(addr = %http_handle.local_addr(), "System ready");
    info!("Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown
    shutdown_tx.shutdown();
    http_handle.stop().await;
    let drained = tokio::time::timeout(
        GRACEFUL_SHUTDOWN_TIMEOUT,
        futures::future::join_all(worker_handles),
    )
    .await;
    if drained.is_err() {
        warn!("Workers did not drain before the shutdown timeout");
    }
    pool.close().await;

    info!("Shutdown complete.");
    Ok(())
}

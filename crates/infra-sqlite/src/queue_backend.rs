// SQLite Queue Backend Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use queuescale_core::domain::{QueueDescriptor, Task, TaskId, TaskPayload, TaskState, TaskType};
use queuescale_core::error::{AppError, Result};
use queuescale_core::port::{ActiveTask, QueueBackend, QueueRegistry, TaskRepository, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct SqliteQueueBackend {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteQueueBackend {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

#[async_trait]
impl QueueBackend for SqliteQueueBackend {
    async fn list_queues(&self) -> Result<Vec<QueueDescriptor>> {
        let rows: Vec<QueueRow> =
            sqlx::query_as("SELECT name, worker_concurrency FROM queues ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(QueueRow::into_descriptor).collect())
    }

    async fn list_active_tasks(&self) -> Result<Vec<ActiveTask>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT id, queue_name FROM tasks WHERE state IN (?, ?)")
                .bind(TaskState::Enqueued.as_str())
                .bind(TaskState::Pending.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|(id, queue)| ActiveTask { id, queue })
            .collect())
    }
}

#[async_trait]
impl QueueRegistry for SqliteQueueBackend {
    async fn register_queue(&self, queue: &QueueDescriptor) -> Result<()> {
        let now = self.time_provider.now_millis();

        sqlx::query(
            r#"
            INSERT INTO queues (name, worker_concurrency, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE
            SET worker_concurrency = excluded.worker_concurrency,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&queue.name)
        .bind(queue.worker_concurrency)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_queue(&self, name: &str) -> Result<Option<QueueDescriptor>> {
        let row: Option<QueueRow> =
            sqlx::query_as("SELECT name, worker_concurrency FROM queues WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(row.map(QueueRow::into_descriptor))
    }
}

#[async_trait]
impl TaskRepository for SqliteQueueBackend {
    async fn insert(&self, task: &Task) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, queue_name, task_type, state, payload,
                created_at, started_at, finished_at, output, error
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task.id)
        .bind(&task.queue)
        .bind(task.task_type.as_str())
        .bind(task.state.as_str())
        .bind(task.payload.as_value().to_string())
        .bind(task.created_at)
        .bind(task.started_at)
        .bind(task.finished_at)
        .bind(&task.output)
        .bind(&task.error)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>> {
        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(TaskRow::into_task).transpose()
    }

    async fn update(&self, task: &Task) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET state = ?, started_at = ?, finished_at = ?, output = ?, error = ?
            WHERE id = ?
            "#,
        )
        .bind(task.state.as_str())
        .bind(task.started_at)
        .bind(task.finished_at)
        .bind(&task.output)
        .bind(&task.error)
        .bind(&task.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Task {} not found", task.id)));
        }
        Ok(())
    }

    async fn claim_next(&self, queue: &str) -> Result<Option<Task>> {
        // Single statement: two workers can never claim the same row
        let row: Option<TaskRow> = sqlx::query_as(
            r#"
            UPDATE tasks
            SET state = ?, started_at = ?
            WHERE id = (
                SELECT id FROM tasks
                WHERE queue_name = ? AND state = ?
                ORDER BY created_at ASC, id ASC
                LIMIT 1
            )
            RETURNING *
            "#,
        )
        .bind(TaskState::Pending.as_str())
        .bind(self.time_provider.now_millis())
        .bind(queue)
        .bind(TaskState::Enqueued.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(TaskRow::into_task).transpose()
    }

    async fn find_by_state(&self, state: TaskState) -> Result<Vec<Task>> {
        let rows: Vec<TaskRow> =
            sqlx::query_as("SELECT * FROM tasks WHERE state = ? ORDER BY created_at ASC, id ASC")
                .bind(state.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        rows.into_iter().map(TaskRow::into_task).collect()
    }

    async fn count_by_state(&self, queue: &str, state: TaskState) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE queue_name = ? AND state = ?")
                .bind(queue)
                .bind(state.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(count)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct QueueRow {
    name: String,
    worker_concurrency: Option<i64>,
}

impl QueueRow {
    // Negative values are kept as-is; the estimator rejects them.
    fn into_descriptor(self) -> QueueDescriptor {
        QueueDescriptor::new(self.name, self.worker_concurrency)
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: String,
    queue_name: String,
    task_type: String,
    state: String,
    payload: String,
    created_at: i64,
    started_at: Option<i64>,
    finished_at: Option<i64>,
    output: Option<String>,
    error: Option<String>,
}

impl TaskRow {
    fn into_task(self) -> Result<Task> {
        let state: TaskState = self.state.parse().map_err(|_| {
            AppError::MalformedResponse(format!(
                "task {} has unknown state '{}'",
                self.id, self.state
            ))
        })?;

        let payload: serde_json::Value = serde_json::from_str(&self.payload).map_err(|e| {
            AppError::MalformedResponse(format!("task {} has invalid payload: {}", self.id, e))
        })?;

        Ok(Task {
            id: self.id,
            queue: self.queue_name,
            task_type: TaskType::new(self.task_type),
            state,
            payload: TaskPayload::new(payload),
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
            output: self.output,
            error: self.error,
        })
    }
}

//! Daemon settings
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! TOML file (`QUEUESCALE_CONFIG`, default `queuescale.toml`), then
//! `QUEUESCALE_*` environment variables.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use queuescale_core::domain::QueueDescriptor;
use serde::Deserialize;
use std::time::Duration;

const ENV_PREFIX: &str = "QUEUESCALE";
const CONFIG_FILE_ENV: &str = "QUEUESCALE_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "queuescale.toml";

const DEFAULT_DB_PATH: &str = "~/.queuescale/queuescale.db";
const DEFAULT_HTTP_HOST: &str = "0.0.0.0";
const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_QUEUE: &str = "queue1";
const DEFAULT_QUEUES: &str = "queue1:1";
const DEFAULT_POLL_TIMEOUT_MS: u64 = 5000;
const DEFAULT_LOG_FORMAT: &str = "pretty";

#[derive(Debug, Deserialize)]
struct RawSettings {
    db_path: String,
    http_host: String,
    http_port: u16,
    default_queue: String,
    queues: String,
    poll_timeout_ms: u64,
    log_format: String,
}

/// Resolved daemon settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// SQLite path or URL, `~` expanded
    pub db_path: String,
    pub http_host: String,
    pub http_port: u16,
    pub default_queue: String,
    pub queues: Vec<QueueDescriptor>,
    pub poll_timeout: Duration,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl Settings {
    /// Load from the process environment and the optional config file
    pub fn load() -> Result<Self> {
        let file = std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());
        let builder = base()?
            .add_source(File::with_name(&file).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX));
        Self::resolve(builder.build().context("Failed to read configuration")?)
    }

    fn resolve(config: Config) -> Result<Self> {
        let raw: RawSettings = config
            .try_deserialize()
            .context("Invalid configuration")?;

        let queues = parse_queue_list(&raw.queues)?;
        if !queues.iter().any(|q| q.name == raw.default_queue) {
            anyhow::bail!(
                "default queue '{}' is not in the configured queues",
                raw.default_queue
            );
        }

        let log_format = match raw.log_format.as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            other => anyhow::bail!("Unknown log format '{}' (json|pretty)", other),
        };

        if raw.poll_timeout_ms == 0 {
            anyhow::bail!("poll_timeout_ms must be greater than 0");
        }

        Ok(Self {
            db_path: shellexpand::tilde(&raw.db_path).into_owned(),
            http_host: raw.http_host,
            http_port: raw.http_port,
            default_queue: raw.default_queue,
            queues,
            poll_timeout: Duration::from_millis(raw.poll_timeout_ms),
            log_format,
        })
    }

    #[cfg(test)]
    fn from_sources(
        file_toml: Option<&str>,
        env: std::collections::HashMap<String, String>,
    ) -> Result<Self> {
        use config::FileFormat;

        let mut builder = base()?;
        if let Some(toml) = file_toml {
            builder = builder.add_source(File::from_str(toml, FileFormat::Toml));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).source(Some(env)));
        Self::resolve(builder.build()?)
    }
}

fn base() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(Config::builder()
        .set_default("db_path", DEFAULT_DB_PATH)?
        .set_default("http_host", DEFAULT_HTTP_HOST)?
        .set_default("http_port", i64::from(DEFAULT_HTTP_PORT))?
        .set_default("default_queue", DEFAULT_QUEUE)?
        .set_default("queues", DEFAULT_QUEUES)?
        .set_default("poll_timeout_ms", DEFAULT_POLL_TIMEOUT_MS as i64)?
        .set_default("log_format", DEFAULT_LOG_FORMAT)?)
}

/// Parse `name[:concurrency]` entries separated by commas
pub fn parse_queue_list(list: &str) -> Result<Vec<QueueDescriptor>> {
    let mut queues: Vec<QueueDescriptor> = Vec::new();
    for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let queue: QueueDescriptor = entry
            .parse()
            .with_context(|| format!("Invalid queue entry '{}'", entry))?;
        if queues.iter().any(|q| q.name == queue.name) {
            anyhow::bail!("queue '{}' configured twice", queue.name);
        }
        queues.push(queue);
    }
    if queues.is_empty() {
        anyhow::bail!("at least one queue must be configured");
    }
    Ok(queues)
}

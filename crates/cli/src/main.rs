//! Queuescale CLI - Command-line client for the Queuescale daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tabled::{Table, Tabled};

const DEFAULT_URL: &str = "http://127.0.0.1:8080";

#[derive(Parser)]
#[command(name = "queuescale")]
#[command(about = "Queuescale CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Daemon base URL
    #[arg(long, env = "QUEUESCALE_URL", default_value = DEFAULT_URL)]
    url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the expected worker count
    Metrics,

    /// Enqueue a sleep task
    Enqueue {
        /// Sleep duration in seconds
        duration: i64,

        /// Queue name (daemon default when omitted)
        #[arg(short, long)]
        queue: Option<String>,
    },

    /// Show per-queue concurrency, backlog and demand
    Queues,

    /// Show daemon status
    Status,
}

#[derive(Deserialize)]
struct MetricsResult {
    expected_workers: u64,
}

#[derive(Deserialize, Tabled)]
struct EnqueueResult {
    task_id: String,
    queue: String,
    duration: i64,
}

#[derive(Deserialize, Tabled)]
struct QueueRow {
    name: String,
    #[tabled(display_with = "display_concurrency")]
    worker_concurrency: i64,
    backlog: i64,
    demand: u64,
}

fn display_concurrency(limit: &i64) -> String {
    if *limit > 0 {
        limit.to_string()
    } else {
        "uncapped".to_string()
    }
}

#[derive(Deserialize)]
struct HealthResult {
    status: String,
    version: String,
    uptime_seconds: u64,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

async fn get_json<T: DeserializeOwned>(url: &str, query: &[(&str, String)]) -> Result<T> {
    let response = reqwest::Client::new()
        .get(url)
        .query(query)
        .send()
        .await
        .context("Failed to connect to daemon")?;

    let status = response.status();
    if !status.is_success() {
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => "no error body".to_string(),
        };
        anyhow::bail!("HTTP {}: {}", status, message);
    }

    response.json().await.context("Failed to parse response")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Metrics => {
            let result: MetricsResult = get_json(&endpoint(&cli.url, "metrics"), &[]).await?;
            println!(
                "{} {}",
                "Expected workers:".bold(),
                result.expected_workers.to_string().green().bold()
            );
        }

        Commands::Enqueue { duration, queue } => {
            let query: Vec<(&str, String)> = queue.map(|q| vec![("queue", q)]).unwrap_or_default();
            let result: EnqueueResult =
                get_json(&endpoint(&cli.url, &format!("enqueue/{}", duration)), &query).await?;

            println!("{}", "✓ Task enqueued successfully".green().bold());
            println!();
            println!("{}", Table::new(vec![result]));
        }

        Commands::Queues => {
            let rows: Vec<QueueRow> = get_json(&endpoint(&cli.url, "queues"), &[]).await?;
            if rows.is_empty() {
                println!("{}", "No queues registered".yellow());
            } else {
                println!("{}", Table::new(rows));
            }
        }

        Commands::Status => {
            println!("{}", "System Status".cyan().bold());
            println!();

            match get_json::<HealthResult>(&endpoint(&cli.url, "healthz"), &[]).await {
                Ok(health) => {
                    println!("  {} {}", "URL:".bold(), cli.url);
                    println!("  {} {}", "Status:".bold(), health.status.to_uppercase().green());
                    println!("  {} {}", "Version:".bold(), health.version);
                    println!("  {} {} seconds", "Uptime:".bold(), health.uptime_seconds);

                    match get_json::<MetricsResult>(&endpoint(&cli.url, "metrics"), &[]).await {
                        Ok(m) => println!("  {} {}", "Expected workers:".bold(), m.expected_workers),
                        Err(e) => println!("  {} {}", "Metric:".bold(), e.to_string().red()),
                    }
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}

//! hotelfeed - TBO hotel static-data ingestion
//!
//! Fetches hotel inventory for every enabled country and stores one
//! normalized document per destination.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use hotelfeed_core::{Backoff, MemorySink, RecordSink, RetryPolicy};
use hotelfeed_store::MongoSink;
use hotelfeed_tbo::runner::{RunOptions, run};
use hotelfeed_tbo::{TboClient, TboConfig};

#[derive(Parser)]
#[command(name = "hotelfeed")]
#[command(about = "TBO hotel static-data ingestion")]
#[command(version)]
struct Cli {
    /// Concurrent destination fetches
    #[arg(long, default_value_t = hotelfeed_core::DEFAULT_WORKERS)]
    workers: usize,

    /// Attempts per upstream request
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    /// Pause between retry attempts, in milliseconds
    #[arg(long, default_value_t = 1000)]
    retry_delay_ms: u64,

    /// MongoDB connection string; without it records stay in memory (dry run)
    #[arg(long, env = "MONGODB_URL")]
    mongo_url: Option<String>,

    /// Target database
    #[arg(long, default_value = "hotels")]
    database: String,

    /// Target collection
    #[arg(long, default_value = "hotelData")]
    collection: String,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

async fn run_ingestion(cli: Cli) -> anyhow::Result<()> {
    let config = Arc::new(TboConfig::from_env()?);

    let retry = RetryPolicy {
        max_attempts: cli.max_attempts.max(1),
        backoff: Backoff::Fixed(Duration::from_millis(cli.retry_delay_ms)),
    };
    let api = Arc::new(TboClient::new(config, retry)?);

    let sink: Arc<dyn RecordSink> = match &cli.mongo_url {
        Some(uri) => Arc::new(MongoSink::connect(uri, &cli.database, &cli.collection).await?),
        None => {
            log::warn!("no MONGODB_URL set, running dry with an in-memory sink");
            Arc::new(MemorySink::new())
        }
    };

    run(
        api,
        sink,
        RunOptions {
            workers: cli.workers.max(1),
        },
    )
    .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Missing .env is fine; real deployments set variables directly
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    hotelfeed_core::init_logging(cli.debug);

    match run_ingestion(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("ingestion failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

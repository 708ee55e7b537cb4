//! OpenAQ ingester.
//!
//! Resolves the store (primary or seeded fallback), then walks the provider's
//! measurement pages from `--since` until an empty page, committing each page
//! in its own transaction.

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use ingestion::{Pipeline, RemoteClient};
use storage::{StorageAdapter, StorageConfig};

use config::Args;

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    if let Err(e) = run(args).await {
        error!(error = %format!("{:#}", e), "Ingestion failed");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    info!(since = %args.since, base_url = %args.base_url, "Starting OpenAQ ingestion");

    let storage_config = StorageConfig::from_env().context("Invalid storage configuration")?;
    let storage = StorageAdapter::connect(&storage_config)
        .await
        .context("No usable store")?;

    let client = RemoteClient::new(args.client_config())?;
    let pipeline = Pipeline::new(client, storage.clone())
        .with_pagination(args.pagination())
        .with_retry(args.retry());

    let result = pipeline.run(args.since).await;
    storage.close().await;
    let report = result?;

    info!(
        mode = %storage.mode(),
        pages = report.pages_written,
        stations = report.stations_written,
        observations_submitted = report.observations_submitted,
        observations_inserted = report.observations_inserted,
        "OpenAQ ingestion complete"
    );

    Ok(())
}

//! Air Quality API Server
//!
//! Read-only HTTP access to ingested stations and observations.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use aq_api::config::{cors_layer, cors_origins_from_env};
use aq_api::state::AppState;
use storage::StorageConfig;

/// Air Quality API Server
#[derive(Parser, Debug)]
#[command(name = "aq-api")]
#[command(about = "HTTP query service for ingested air-quality data")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8000", env = "AQ_LISTEN_ADDR")]
    listen: SocketAddr,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "AQ_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Build runtime with configured threads
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> Result<()> {
    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    // Initialize Prometheus metrics exporter
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    info!("Starting Air Quality API server");

    let cors = cors_layer(&cors_origins_from_env()?)?;
    let storage_config = StorageConfig::from_env()?;

    // Initialize application state
    let state = Arc::new(
        AppState::new(&storage_config, Some(prometheus_handle))
            .await
            .context("No usable store")?,
    );
    info!(storage = %state.storage.mode(), "Storage ready");

    let app = aq_api::app(state, cors);

    info!("Air Quality API listening on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;
    axum::serve(listener, app).await.context("Server failed")?;

    Ok(())
}

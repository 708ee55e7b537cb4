//! Ingester command-line configuration.

use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;

use ingestion::{ClientConfig, PaginationPolicy, RetryPolicy, DEFAULT_BASE_URL};

#[derive(Parser, Debug)]
#[command(name = "ingester")]
#[command(about = "Ingest OpenAQ measurements into the air-quality store")]
pub struct Args {
    /// Earliest measurement date to request (YYYY-MM-DD)
    #[arg(long, default_value = "2025-01-01")]
    pub since: NaiveDate,

    /// Provider base URL; `/measurements` is appended
    #[arg(long, env = "OPENAQ_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Stop after this many pages (default: until the provider runs dry)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_pages: Option<u32>,

    /// Retries for transient fetch failures
    #[arg(long, default_value_t = 0)]
    pub max_retries: u32,

    /// Log level
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn pagination(&self) -> PaginationPolicy {
        PaginationPolicy {
            max_pages: self.max_pages,
            ..Default::default()
        }
    }

    pub fn retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            ..Default::default()
        }
    }
}

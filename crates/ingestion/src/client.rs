//! Paginated access to the provider's measurements endpoint.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{IngestionError, Result};
use crate::payload::Measurement;

/// Records requested per page.
pub const PAGE_SIZE: u32 = 100;

/// Default provider base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openaq.org/v2";

/// One page of decoded measurements.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub number: u32,
    pub records: Vec<Measurement>,
}

impl Page {
    /// Decode every raw record; the first malformed one fails the page.
    pub fn parse(number: u32, results: Vec<Value>) -> Result<Self> {
        let records = results
            .into_iter()
            .map(Measurement::from_value)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { number, records })
    }

    /// An empty page ends pagination.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Anything that can hand out numbered pages of measurements.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, since: NaiveDate, page: u32) -> Result<Page>;
}

/// Configuration for [`RemoteClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MeasurementsResponse {
    #[serde(default)]
    results: Vec<Value>,
}

/// HTTP client for `{base_url}/measurements`.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: Client,
    endpoint: String,
}

impl RemoteClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(IngestionError::InvalidConfig(
                "base URL must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                IngestionError::InvalidConfig(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/measurements", config.base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PageSource for RemoteClient {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch_page(&self, since: NaiveDate, page: u32) -> Result<Page> {
        let params = [
            ("limit", PAGE_SIZE.to_string()),
            ("page", page.to_string()),
            ("date_from", since.format("%Y-%m-%d").to_string()),
            ("order_by", "datetime".to_string()),
            ("sort", "asc".to_string()),
        ];

        let fetch_err = |source| IngestionError::Fetch {
            url: self.endpoint.clone(),
            source,
        };

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(fetch_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestionError::HttpStatus {
                status: status.as_u16(),
                page,
            });
        }

        let body = response.bytes().await.map_err(fetch_err)?;
        let decoded: MeasurementsResponse =
            serde_json::from_slice(&body).map_err(|e| IngestionError::Decode {
                page,
                message: e.to_string(),
            })?;

        debug!(page = page, records = decoded.results.len(), "Fetched page");
        Page::parse(page, decoded.results)
    }
}

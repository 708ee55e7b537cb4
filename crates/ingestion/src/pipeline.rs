//! The page loop: fetch, normalize, and persist one page per transaction.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use metrics::counter;
use tracing::{info, instrument, warn};

use storage::{StorageAdapter, UpsertWriter};

use crate::client::{Page, PageSource};
use crate::error::{IngestionError, Result};
use crate::transform::{RecordTransformer, TransformedPage};

/// Where pagination starts and whether it is capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationPolicy {
    pub start_page: u32,
    /// Stop after this many non-empty pages even if the provider has more.
    pub max_pages: Option<u32>,
}

impl Default for PaginationPolicy {
    fn default() -> Self {
        Self {
            start_page: 1,
            max_pages: None,
        }
    }
}

/// Retry behavior for page fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum retry attempts after the first failure. Zero disables retry.
    pub max_retries: u32,
    /// Initial retry delay (doubles each retry)
    pub initial_delay: Duration,
    /// Maximum retry delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
        }
    }
}

/// Totals for one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Pages committed, one transaction each.
    pub pages_written: u32,
    pub stations_written: u64,
    pub observations_submitted: u64,
    /// Observations actually created; key conflicts are skipped.
    pub observations_inserted: u64,
}

/// Sequential fetch/transform/write loop over a [`PageSource`].
pub struct Pipeline<S> {
    source: S,
    storage: StorageAdapter,
    writer: UpsertWriter,
    transformer: RecordTransformer,
    pagination: PaginationPolicy,
    retry: RetryPolicy,
}

impl<S: PageSource> Pipeline<S> {
    pub fn new(source: S, storage: StorageAdapter) -> Self {
        let writer = UpsertWriter::new(storage.mode());
        Self {
            source,
            storage,
            writer,
            transformer: RecordTransformer::default(),
            pagination: PaginationPolicy::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_pagination(mut self, pagination: PaginationPolicy) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Ingest every page from `since` onward.
    ///
    /// Stops at the first empty page or at the page cap. Any fetch, decode
    /// or write error aborts the run; pages committed before it stay.
    #[instrument(skip(self), fields(mode = %self.storage.mode()))]
    pub async fn run(&self, since: NaiveDate) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        let mut page_number = self.pagination.start_page;

        loop {
            if let Some(max_pages) = self.pagination.max_pages {
                if report.pages_written >= max_pages {
                    info!(max_pages = max_pages, "Page cap reached, stopping");
                    break;
                }
            }

            let page = self.fetch_with_retry(since, page_number).await?;
            if page.is_empty() {
                info!(page = page_number, "Empty page, ingestion complete");
                break;
            }

            let rows = self.transformer.transform(&page.records);
            let submitted = rows.observations.len() as u64;
            let (stations, inserted) = self.write_page(rows).await?;

            report.pages_written += 1;
            report.stations_written += stations;
            report.observations_submitted += submitted;
            report.observations_inserted += inserted;

            counter!("ingest_pages_total").increment(1);
            counter!("ingest_stations_total").increment(stations);
            counter!("ingest_observations_total").increment(inserted);

            info!(
                page = page_number,
                records = page.records.len(),
                stations = stations,
                observations = inserted,
                skipped = submitted - inserted,
                "Page written"
            );

            page_number += 1;
        }

        Ok(report)
    }

    async fn fetch_with_retry(&self, since: NaiveDate, page: u32) -> Result<Page> {
        let mut retry_count = 0;
        let mut delay = self.retry.initial_delay;

        loop {
            match self.source.fetch_page(since, page).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_transient() && retry_count < self.retry.max_retries => {
                    retry_count += 1;
                    counter!("ingest_fetch_retries_total").increment(1);
                    warn!(
                        page = page,
                        error = %e,
                        retry = retry_count,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(delay * 2, self.retry.max_delay);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Persist one page's rows in a single transaction.
    async fn write_page(&self, rows: TransformedPage) -> Result<(u64, u64)> {
        let writer = self.writer.clone();
        let seen_at = Utc::now();

        self.storage
            .with_session(move |session| {
                Box::pin(async move {
                    let stations = writer
                        .upsert_stations(session, &rows.stations, seen_at)
                        .await?;
                    let inserted = writer
                        .insert_observations(session, &rows.observations)
                        .await?;
                    Ok::<_, IngestionError>((stations, inserted))
                })
            })
            .await
    }
}

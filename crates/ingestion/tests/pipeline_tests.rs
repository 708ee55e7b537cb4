//! Page-loop tests against a scripted page source and the fallback store.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::SqlitePool;

use ingestion::{
    IngestionError, Page, PageSource, PaginationPolicy, Pipeline, Result, RetryPolicy,
};
use storage::{Backend, StorageAdapter};
use test_utils::fixtures::{bare_record, embedded_record, sample_records};
use test_utils::TempStore;

/// What the stub hands out for the next request.
enum Scripted {
    Records(Vec<Value>),
    Status(u16),
}

/// Serves scripted pages in order, then empty pages forever.
struct StubSource {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<u32>>,
    /// Statement run against the store just before serving the given page.
    sabotage: Option<(u32, SqlitePool, &'static str)>,
}

impl StubSource {
    fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
            sabotage: None,
        }
    }

    fn pages(pages: Vec<Vec<Value>>) -> Self {
        Self::new(pages.into_iter().map(Scripted::Records).collect())
    }

    fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for StubSource {
    async fn fetch_page(&self, _since: NaiveDate, page: u32) -> Result<Page> {
        self.calls.lock().unwrap().push(page);

        if let Some((at, pool, sql)) = &self.sabotage {
            if *at == page {
                sqlx::query(sql).execute(pool).await.unwrap();
            }
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Records(records)) => Page::parse(page, records),
            Some(Scripted::Status(status)) => Err(IngestionError::HttpStatus { status, page }),
            None => Ok(Page {
                number: page,
                records: Vec::new(),
            }),
        }
    }
}

async fn fallback_store() -> (TempStore, StorageAdapter) {
    let store = TempStore::new();
    let adapter = StorageAdapter::fallback(&store.db_path()).await.unwrap();
    (store, adapter)
}

fn sqlite(adapter: &StorageAdapter) -> SqlitePool {
    match adapter.backend() {
        Backend::Sqlite(pool) => pool.clone(),
        Backend::Postgres(_) => panic!("expected the fallback store"),
    }
}

async fn count(pool: &SqlitePool, sql: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Stations and observations written by ingestion, ignoring the demo seed.
async fn ingested_counts(pool: &SqlitePool) -> (i64, i64) {
    (
        count(pool, "SELECT COUNT(*) FROM stations WHERE station_id <> 'DEMO_1'").await,
        count(pool, "SELECT COUNT(*) FROM observations WHERE station_id <> 'DEMO_1'").await,
    )
}

fn since() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
    }
}

fn one_record_page(id: u64, time: &str) -> Vec<Value> {
    vec![embedded_record(id, "Station", time, "pm25", 1.0)]
}

/// Two readings for station `1` sharing a timestamp plus one for `B`.
fn scenario_page() -> Vec<Value> {
    vec![
        embedded_record(1, "Station A", "2025-01-01T00:00:00Z", "pm25", 10.5),
        embedded_record(1, "Station A (renamed)", "2025-01-01T00:00:00Z", "pm25", 12.0),
        bare_record("B", 40.71, -74.0, "2025-01-01T00:00:00Z", "o3", 0.031),
    ]
}

// ============================================================================
// Pagination
// ============================================================================

#[tokio::test]
async fn test_stops_at_first_empty_page() {
    let (_store, adapter) = fallback_store().await;
    let source = StubSource::pages(vec![
        one_record_page(1, "2025-01-01T00:00:00Z"),
        one_record_page(2, "2025-01-01T01:00:00Z"),
        one_record_page(3, "2025-01-01T02:00:00Z"),
    ]);

    let pipeline = Pipeline::new(source, adapter.clone());
    let report = pipeline.run(since()).await.unwrap();

    assert_eq!(report.pages_written, 3);
    assert_eq!(pipeline.source().calls(), vec![1, 2, 3, 4]);
    assert_eq!(ingested_counts(&sqlite(&adapter)).await, (3, 3));
}

#[tokio::test]
async fn test_page_cap() {
    let (_store, adapter) = fallback_store().await;
    let source = StubSource::pages(
        (1..=5)
            .map(|i| one_record_page(i, "2025-01-01T00:00:00Z"))
            .collect(),
    );

    let pipeline = Pipeline::new(source, adapter.clone()).with_pagination(PaginationPolicy {
        start_page: 1,
        max_pages: Some(2),
    });
    let report = pipeline.run(since()).await.unwrap();

    assert_eq!(report.pages_written, 2);
    assert_eq!(pipeline.source().calls(), vec![1, 2]);
}

#[tokio::test]
async fn test_start_page() {
    let (_store, adapter) = fallback_store().await;
    let source = StubSource::pages(vec![one_record_page(1, "2025-01-01T00:00:00Z")]);

    let pipeline = Pipeline::new(source, adapter).with_pagination(PaginationPolicy {
        start_page: 7,
        max_pages: None,
    });
    pipeline.run(since()).await.unwrap();

    assert_eq!(pipeline.source().calls(), vec![7, 8]);
}

#[tokio::test]
async fn test_immediately_empty_run() {
    let (_store, adapter) = fallback_store().await;
    let pipeline = Pipeline::new(StubSource::pages(vec![]), adapter.clone());

    let report = pipeline.run(since()).await.unwrap();
    assert_eq!(report, Default::default());
    assert_eq!(ingested_counts(&sqlite(&adapter)).await, (0, 0));
}

// ============================================================================
// Normalization and idempotence
// ============================================================================

#[tokio::test]
async fn test_mixed_shapes_produce_unique_stations() {
    let (_store, adapter) = fallback_store().await;
    let pipeline = Pipeline::new(StubSource::pages(vec![sample_records()]), adapter.clone());

    let report = pipeline.run(since()).await.unwrap();
    assert_eq!(report.stations_written, 2);

    let ids: Vec<String> = sqlx::query_scalar(
        "SELECT station_id FROM stations WHERE station_id <> 'DEMO_1' ORDER BY station_id",
    )
    .fetch_all(&sqlite(&adapter))
    .await
    .unwrap();
    assert_eq!(ids, vec!["1".to_string(), "B".to_string()]);

    let name: String = sqlx::query_scalar("SELECT name FROM stations WHERE station_id = 'B'")
        .fetch_one(&sqlite(&adapter))
        .await
        .unwrap();
    assert_eq!(name, "OpenAQ B");
}

#[tokio::test]
async fn test_rerunning_a_page_changes_nothing() {
    let (_store, adapter) = fallback_store().await;
    let pool = sqlite(&adapter);

    let first = Pipeline::new(StubSource::pages(vec![scenario_page()]), adapter.clone())
        .run(since())
        .await
        .unwrap();
    assert_eq!(first.observations_submitted, 3);
    assert_eq!(first.observations_inserted, 2);
    assert_eq!(ingested_counts(&pool).await, (2, 2));

    let first_seen = |pool: SqlitePool| async move {
        sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT first_seen FROM stations WHERE station_id = '1'",
        )
        .fetch_one(&pool)
        .await
        .unwrap()
    };
    let seen_before = first_seen(pool.clone()).await;

    let second = Pipeline::new(StubSource::pages(vec![scenario_page()]), adapter.clone())
        .run(since())
        .await
        .unwrap();
    assert_eq!(second.observations_inserted, 0);
    assert_eq!(ingested_counts(&pool).await, (2, 2));
    assert_eq!(first_seen(pool.clone()).await, seen_before);

    let (name, value): (String, f64) = sqlx::query_as(
        "SELECT s.name, o.value FROM stations s \
         JOIN observations o ON o.station_id = s.station_id \
         WHERE s.station_id = '1'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(name, "Station A (renamed)");
    assert_eq!(value, 10.5, "first written value is retained");
}

// ============================================================================
// Atomicity
// ============================================================================

#[tokio::test]
async fn test_failed_page_leaves_no_partial_rows() {
    let (_store, adapter) = fallback_store().await;
    let pool = sqlite(&adapter);

    let mut source = StubSource::pages(vec![
        one_record_page(1, "2025-01-01T00:00:00Z"),
        one_record_page(2, "2025-01-01T01:00:00Z"),
    ]);
    // The station upsert for page 2 succeeds; its observation insert cannot.
    source.sabotage = Some((2, pool.clone(), "DROP TABLE observations"));

    let result = Pipeline::new(source, adapter.clone()).run(since()).await;
    assert!(matches!(result, Err(IngestionError::Storage(_))));

    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM stations WHERE station_id = '1'").await,
        1
    );
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM stations WHERE station_id = '2'").await,
        0
    );
}

#[tokio::test]
async fn test_malformed_record_aborts_before_writing() {
    let (_store, adapter) = fallback_store().await;
    let mut broken = bare_record("Q", 1.0, 2.0, "2025-01-01T00:00:00Z", "o3", 1.0);
    broken["date"] = Value::Null;

    let page = vec![
        embedded_record(5, "Good", "2025-01-01T00:00:00Z", "pm25", 1.0),
        broken,
    ];
    let result = Pipeline::new(StubSource::pages(vec![page]), adapter.clone())
        .run(since())
        .await;

    assert!(matches!(result, Err(IngestionError::MalformedRecord(_))));
    assert_eq!(ingested_counts(&sqlite(&adapter)).await, (0, 0));
}

// ============================================================================
// Retry
// ============================================================================

#[tokio::test]
async fn test_no_retry_by_default() {
    let (_store, adapter) = fallback_store().await;
    let source = StubSource::new(vec![Scripted::Status(503)]);

    let pipeline = Pipeline::new(source, adapter);
    let result = pipeline.run(since()).await;

    assert!(matches!(
        result,
        Err(IngestionError::HttpStatus { status: 503, page: 1 })
    ));
    assert_eq!(pipeline.source().calls(), vec![1]);
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let (_store, adapter) = fallback_store().await;
    let source = StubSource::new(vec![
        Scripted::Status(503),
        Scripted::Status(429),
        Scripted::Records(one_record_page(1, "2025-01-01T00:00:00Z")),
    ]);

    let pipeline = Pipeline::new(source, adapter).with_retry(fast_retry(2));
    let report = pipeline.run(since()).await.unwrap();

    assert_eq!(report.pages_written, 1);
    assert_eq!(pipeline.source().calls(), vec![1, 1, 1, 2]);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let (_store, adapter) = fallback_store().await;
    let source = StubSource::new(vec![
        Scripted::Status(500),
        Scripted::Status(502),
        Scripted::Records(one_record_page(1, "2025-01-01T00:00:00Z")),
    ]);

    let pipeline = Pipeline::new(source, adapter).with_retry(fast_retry(1));
    let result = pipeline.run(since()).await;

    assert!(matches!(
        result,
        Err(IngestionError::HttpStatus { status: 502, .. })
    ));
    assert_eq!(pipeline.source().calls(), vec![1, 1]);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let (_store, adapter) = fallback_store().await;
    let source = StubSource::new(vec![Scripted::Status(404)]);

    let pipeline = Pipeline::new(source, adapter).with_retry(fast_retry(3));
    assert!(pipeline.run(since()).await.is_err());
    assert_eq!(pipeline.source().calls(), vec![1]);
}

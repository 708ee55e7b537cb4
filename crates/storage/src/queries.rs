//! Read queries over the stations and observations relations.
//!
//! Table names come from the [`StorageMode`](crate::StorageMode) captured at
//! construction; nothing here assumes a schema prefix.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use sqlx::FromRow;

use aq_common::{
    AqError, AqResult, HourlyAggregate, Observation, Station, Summary, OBSERVATIONS_TABLE,
    STATIONS_TABLE,
};

use crate::adapter::{on_pool, Backend, StorageAdapter};

/// Maximum stations returned by [`Queries::list_stations`].
pub const STATION_LIMIT: i64 = 1000;

/// Default row limit for observation listings.
pub const DEFAULT_OBSERVATION_LIMIT: i64 = 1000;

/// Hard cap on observation listings.
pub const MAX_OBSERVATION_LIMIT: i64 = 10_000;

/// Optional filters for observation listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObservationFilter {
    pub station_id: Option<String>,
    pub parameter: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

/// Station/parameter pair and optional time window for hourly aggregates.
#[derive(Debug, Clone, Deserialize)]
pub struct HourlyFilter {
    pub station_id: String,
    pub parameter: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// A bind value for dynamically assembled WHERE clauses.
#[derive(Debug, Clone)]
enum Param {
    Text(String),
    Time(DateTime<Utc>),
    Int(i64),
}

/// Bind each [`Param`] in order onto a sqlx query.
macro_rules! bind_params {
    ($query:expr, $params:expr) => {{
        let mut query = $query;
        for param in $params {
            query = match param {
                Param::Text(v) => query.bind(v),
                Param::Time(v) => query.bind(v),
                Param::Int(v) => query.bind(v),
            };
        }
        query
    }};
}

/// Accumulates `column op $N` clauses alongside their bind values.
#[derive(Debug, Default)]
struct Conditions {
    clauses: Vec<String>,
    params: Vec<Param>,
}

impl Conditions {
    fn push(&mut self, column: &str, op: &str, value: Param) {
        self.params.push(value);
        self.clauses
            .push(format!("{} {} ${}", column, op, self.params.len()));
    }

    /// Bind a trailing value (e.g. LIMIT) and return its placeholder.
    fn placeholder(&mut self, value: Param) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }
}

/// Query builder bound to one store and one storage mode.
#[derive(Debug, Clone)]
pub struct Queries {
    backend: Backend,
    stations_table: String,
    observations_table: String,
}

impl Queries {
    pub fn new(adapter: &StorageAdapter) -> Self {
        Self {
            backend: adapter.backend().clone(),
            stations_table: adapter.table_name(STATIONS_TABLE),
            observations_table: adapter.table_name(OBSERVATIONS_TABLE),
        }
    }

    /// All known stations ordered by identifier.
    pub async fn list_stations(&self) -> AqResult<Vec<Station>> {
        let sql = format!(
            "SELECT station_id, name, provider, country, city, latitude, longitude, elevation_m \
             FROM {} ORDER BY station_id LIMIT {}",
            self.stations_table, STATION_LIMIT
        );

        let rows = on_pool!(&self.backend, pool => sqlx::query_as::<_, StationRecord>(&sql)
            .fetch_all(pool)
            .await)
        .map_err(|e| AqError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(rows.into_iter().map(Station::from).collect())
    }

    /// Observations matching `filter`, newest first.
    pub async fn list_observations(&self, filter: &ObservationFilter) -> AqResult<Vec<Observation>> {
        let limit = match filter.limit {
            Some(limit) if limit < 1 => {
                return Err(AqError::invalid_parameter("limit", "must be at least 1"));
            }
            Some(limit) => limit.min(MAX_OBSERVATION_LIMIT),
            None => DEFAULT_OBSERVATION_LIMIT,
        };
        check_window(filter.start, filter.end)?;

        let mut conditions = Conditions::default();
        if let Some(station_id) = &filter.station_id {
            conditions.push("station_id", "=", Param::Text(station_id.clone()));
        }
        if let Some(parameter) = &filter.parameter {
            conditions.push("parameter", "=", Param::Text(parameter.clone()));
        }
        if let Some(start) = filter.start {
            conditions.push("time", ">=", Param::Time(start));
        }
        if let Some(end) = filter.end {
            conditions.push("time", "<=", Param::Time(end));
        }
        let limit_placeholder = conditions.placeholder(Param::Int(limit));

        let sql = format!(
            "SELECT time, station_id, parameter, unit, value, quality, source \
             FROM {} {} ORDER BY time DESC LIMIT {}",
            self.observations_table,
            conditions.where_clause(),
            limit_placeholder
        );

        let params = conditions.params;
        let rows = on_pool!(&self.backend, pool => bind_params!(
                sqlx::query_as::<_, ObservationRecord>(&sql),
                params
            )
            .fetch_all(pool)
            .await)
        .map_err(|e| AqError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(rows.into_iter().map(Observation::from).collect())
    }

    /// Station count and observations recorded in the 24 hours before `now`.
    pub async fn summary(&self, now: DateTime<Utc>) -> AqResult<Summary> {
        let window_start = now - Duration::hours(24);
        let sql = format!(
            "SELECT \
                (SELECT COUNT(*) FROM {}) AS station_count, \
                (SELECT COUNT(*) FROM {} WHERE time >= $1) AS observation_24h",
            self.stations_table, self.observations_table
        );

        let row = on_pool!(&self.backend, pool => sqlx::query_as::<_, SummaryRecord>(&sql)
            .bind(window_start)
            .fetch_one(pool)
            .await)
        .map_err(|e| AqError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(Summary {
            station_count: row.station_count,
            observation_24h: row.observation_24h,
        })
    }

    /// Hourly mean/min/max/count for one station and parameter, computed
    /// from the raw observations.
    ///
    /// `start` and `end` bound the bucket start, so a bucket is either
    /// returned whole or not at all.
    pub async fn hourly(&self, filter: &HourlyFilter) -> AqResult<Vec<HourlyAggregate>> {
        check_window(filter.start, filter.end)?;

        let mut conditions = Conditions::default();
        conditions.push("station_id", "=", Param::Text(filter.station_id.clone()));
        conditions.push("parameter", "=", Param::Text(filter.parameter.clone()));
        if let Some(start) = filter.start {
            conditions.push("bucket", ">=", Param::Time(start));
        }
        if let Some(end) = filter.end {
            conditions.push("bucket", "<=", Param::Time(end));
        }

        let sql = format!(
            "SELECT bucket AS time, station_id, parameter, unit, \
                AVG(value) AS avg_value, MIN(value) AS min_value, MAX(value) AS max_value, \
                COUNT(*) AS n \
             FROM (SELECT {} AS bucket, station_id, parameter, unit, value FROM {}) AS b \
             {} \
             GROUP BY bucket, station_id, parameter, unit \
             ORDER BY bucket",
            hour_bucket(&self.backend),
            self.observations_table,
            conditions.where_clause()
        );

        let params = conditions.params;
        let rows = on_pool!(&self.backend, pool => bind_params!(
                sqlx::query_as::<_, HourlyRecord>(&sql),
                params
            )
            .fetch_all(pool)
            .await)
        .map_err(|e| AqError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(rows.into_iter().map(HourlyAggregate::from).collect())
    }
}

/// Truncation to the UTC hour, independent of the session `TimeZone`.
const POSTGRES_HOUR_BUCKET: &str = "date_trunc('hour', time AT TIME ZONE 'UTC') AT TIME ZONE 'UTC'";

/// Stored as RFC 3339 text; keep the bucket in the same shape.
const SQLITE_HOUR_BUCKET: &str = "strftime('%Y-%m-%dT%H:00:00+00:00', time)";

/// Expression truncating `time` to the start of its hour.
fn hour_bucket(backend: &Backend) -> &'static str {
    match backend {
        Backend::Postgres(_) => POSTGRES_HOUR_BUCKET,
        Backend::Sqlite(_) => SQLITE_HOUR_BUCKET,
    }
}

fn check_window(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> AqResult<()> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(AqError::invalid_parameter(
            "start",
            "must not be later than end",
        )),
        _ => Ok(()),
    }
}

/// Internal row types for database queries.
#[derive(FromRow)]
struct StationRecord {
    station_id: String,
    name: Option<String>,
    provider: Option<String>,
    country: Option<String>,
    city: Option<String>,
    latitude: f64,
    longitude: f64,
    elevation_m: Option<f64>,
}

impl From<StationRecord> for Station {
    fn from(row: StationRecord) -> Self {
        Station {
            station_id: row.station_id,
            name: row.name,
            provider: row.provider.unwrap_or_default(),
            country: row.country,
            city: row.city,
            latitude: row.latitude,
            longitude: row.longitude,
            elevation_m: row.elevation_m,
        }
    }
}

#[derive(FromRow)]
struct ObservationRecord {
    time: DateTime<Utc>,
    station_id: String,
    parameter: String,
    unit: String,
    value: f64,
    quality: Option<String>,
    source: Option<String>,
}

impl From<ObservationRecord> for Observation {
    fn from(row: ObservationRecord) -> Self {
        Observation {
            time: row.time,
            station_id: row.station_id,
            parameter: row.parameter,
            unit: row.unit,
            value: row.value,
            quality: row.quality,
            source: row.source.unwrap_or_default(),
        }
    }
}

#[derive(FromRow)]
struct SummaryRecord {
    station_count: i64,
    observation_24h: i64,
}

#[derive(FromRow)]
struct HourlyRecord {
    time: DateTime<Utc>,
    station_id: String,
    parameter: String,
    unit: String,
    avg_value: f64,
    min_value: f64,
    max_value: f64,
    n: i64,
}

impl From<HourlyRecord> for HourlyAggregate {
    fn from(row: HourlyRecord) -> Self {
        HourlyAggregate {
            time: row.time,
            station_id: row.station_id,
            parameter: row.parameter,
            unit: row.unit,
            avg_value: row.avg_value,
            min_value: row.min_value,
            max_value: row.max_value,
            n: row.n,
        }
    }
}

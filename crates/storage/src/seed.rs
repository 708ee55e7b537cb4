//! Schema and demo dataset for the local fallback store.

use chrono::{DateTime, Duration, DurationRound, Utc};
use sqlx::SqlitePool;

use aq_common::{AqError, AqResult, Observation, Station};

use crate::mode::StorageMode;
use crate::session::Session;
use crate::writer::UpsertWriter;

/// Identifier of the single demo station.
pub const DEMO_STATION_ID: &str = "DEMO_1";

/// Parameter carried by every demo observation.
pub const DEMO_PARAMETER: &str = "pm25";

const DEMO_VALUES: [f64; 3] = [14.2, 18.9, 12.1];

/// Database schema SQL for the fallback store.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS stations (
    station_id  TEXT PRIMARY KEY,
    name        TEXT,
    provider    TEXT,
    country     TEXT,
    city        TEXT,
    latitude    REAL NOT NULL,
    longitude   REAL NOT NULL,
    elevation_m REAL,
    first_seen  TEXT,
    last_seen   TEXT
);

CREATE TABLE IF NOT EXISTS observations (
    time       TEXT NOT NULL,
    station_id TEXT NOT NULL,
    parameter  TEXT NOT NULL,
    unit       TEXT NOT NULL,
    value      REAL NOT NULL,
    quality    TEXT,
    source     TEXT,
    PRIMARY KEY (time, station_id, parameter)
);

CREATE INDEX IF NOT EXISTS idx_observations_station_param ON observations(station_id, parameter);
"#;

/// The station every fallback store starts with.
pub fn demo_station() -> Station {
    Station {
        station_id: DEMO_STATION_ID.to_string(),
        name: Some("Demo Station 1".to_string()),
        provider: "demo".to_string(),
        country: Some("US".to_string()),
        city: Some("Raleigh".to_string()),
        latitude: 35.7796,
        longitude: -78.6382,
        elevation_m: Some(96.0),
    }
}

/// Three hourly `pm25` readings ending at `now` (truncated to the second).
pub fn demo_observations(now: DateTime<Utc>) -> Vec<Observation> {
    let now = now.duration_trunc(Duration::seconds(1)).unwrap_or(now);

    DEMO_VALUES
        .iter()
        .enumerate()
        .map(|(idx, &value)| Observation {
            time: now - Duration::hours(2 - idx as i64),
            station_id: DEMO_STATION_ID.to_string(),
            parameter: DEMO_PARAMETER.to_string(),
            unit: "µg/m³".to_string(),
            value,
            quality: Some("ok".to_string()),
            source: "demo".to_string(),
        })
        .collect()
}

/// Create the relations if absent, wipe them, and load the demo rows.
///
/// Runs in one transaction: a half-seeded store is never left behind.
pub async fn bootstrap(pool: &SqlitePool, mode: &StorageMode, now: DateTime<Utc>) -> AqResult<()> {
    let tx = pool
        .begin()
        .await
        .map_err(|e| AqError::FallbackProvisioning(format!("Begin failed: {}", e)))?;
    let mut session = Session::Sqlite(tx);

    for statement in SCHEMA_SQL.split(';') {
        let trimmed = statement.trim();
        if !trimmed.is_empty() {
            session.execute_raw(trimmed).await?;
        }
    }

    let stations = mode.table_name(aq_common::STATIONS_TABLE);
    let observations = mode.table_name(aq_common::OBSERVATIONS_TABLE);
    session
        .execute_raw(&format!("DELETE FROM {}", stations))
        .await?;
    session
        .execute_raw(&format!("DELETE FROM {}", observations))
        .await?;

    let writer = UpsertWriter::new(mode);
    writer
        .upsert_stations(&mut session, &[demo_station()], now)
        .await?;
    writer
        .insert_observations(&mut session, &demo_observations(now))
        .await?;

    session.commit().await
}

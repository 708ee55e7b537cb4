//! Conflict-tolerant writes for stations and observations.

use chrono::{DateTime, Utc};
use tracing::debug;

use aq_common::{AqError, AqResult, Observation, Station, OBSERVATIONS_TABLE, STATIONS_TABLE};

use crate::mode::StorageMode;
use crate::session::{on_session, Session};

/// Rows per multi-row observation INSERT. 7 binds each keeps a statement
/// well under SQLite's default bind-variable limit.
const OBSERVATION_CHUNK: usize = 100;

/// Writes batches inside a caller-supplied [`Session`].
///
/// The SQL is shared by both stores: `$N` placeholders, `ON CONFLICT`
/// clauses, and timestamps bound from the application clock.
#[derive(Debug, Clone)]
pub struct UpsertWriter {
    stations_table: String,
    observations_table: String,
}

impl UpsertWriter {
    pub fn new(mode: &StorageMode) -> Self {
        Self {
            stations_table: mode.table_name(STATIONS_TABLE),
            observations_table: mode.table_name(OBSERVATIONS_TABLE),
        }
    }

    /// Insert new stations or refresh known ones.
    ///
    /// Name, country, city and coordinates follow the latest sighting and
    /// `last_seen` moves to `seen_at`; `first_seen` keeps its original value.
    /// Returns the number of rows inserted or updated.
    pub async fn upsert_stations(
        &self,
        session: &mut Session,
        stations: &[Station],
        seen_at: DateTime<Utc>,
    ) -> AqResult<u64> {
        let sql = format!(
            r#"
            INSERT INTO {} (
                station_id, name, provider, country, city,
                latitude, longitude, elevation_m, first_seen, last_seen
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            ON CONFLICT (station_id) DO UPDATE SET
                name = EXCLUDED.name,
                country = EXCLUDED.country,
                city = EXCLUDED.city,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                last_seen = EXCLUDED.last_seen
            "#,
            self.stations_table
        );

        let mut affected = 0;
        for station in stations {
            let result = on_session!(&mut *session, conn => sqlx::query(&sql)
                .bind(&station.station_id)
                .bind(&station.name)
                .bind(&station.provider)
                .bind(&station.country)
                .bind(&station.city)
                .bind(station.latitude)
                .bind(station.longitude)
                .bind(station.elevation_m)
                .bind(seen_at)
                .execute(&mut *conn)
                .await
                .map(|r| r.rows_affected()));

            affected += result.map_err(|e| {
                AqError::DatabaseError(format!(
                    "Station upsert failed for {}: {}",
                    station.station_id, e
                ))
            })?;
        }

        debug!(
            table = %self.stations_table,
            count = stations.len(),
            affected,
            "Upserted stations"
        );
        Ok(affected)
    }

    /// Insert observations, skipping any whose (time, station, parameter)
    /// already exists. Stored values are never overwritten.
    ///
    /// Returns the number of rows actually created.
    pub async fn insert_observations(
        &self,
        session: &mut Session,
        observations: &[Observation],
    ) -> AqResult<u64> {
        let mut inserted = 0;

        for chunk in observations.chunks(OBSERVATION_CHUNK) {
            let sql = insert_observations_sql(&self.observations_table, chunk.len());

            let result = on_session!(&mut *session, conn => {
                let mut query = sqlx::query(&sql);
                for obs in chunk {
                    query = query
                        .bind(obs.time)
                        .bind(&obs.station_id)
                        .bind(&obs.parameter)
                        .bind(&obs.unit)
                        .bind(obs.value)
                        .bind(&obs.quality)
                        .bind(&obs.source);
                }
                query.execute(&mut *conn).await.map(|r| r.rows_affected())
            });

            inserted += result
                .map_err(|e| AqError::DatabaseError(format!("Observation insert failed: {}", e)))?;
        }

        debug!(
            table = %self.observations_table,
            submitted = observations.len(),
            inserted,
            "Inserted observations"
        );
        Ok(inserted)
    }
}

/// Multi-row insert with `rows` value tuples of 7 placeholders each.
fn insert_observations_sql(table: &str, rows: usize) -> String {
    let mut sql = format!(
        "INSERT INTO {} (time, station_id, parameter, unit, value, quality, source) VALUES ",
        table
    );

    for row in 0..rows {
        if row > 0 {
            sql.push_str(", ");
        }
        let base = row * 7;
        sql.push('(');
        for col in 1..=7 {
            if col > 1 {
                sql.push_str(", ");
            }
            sql.push_str(&format!("${}", base + col));
        }
        sql.push(')');
    }

    sql.push_str(" ON CONFLICT (time, station_id, parameter) DO NOTHING");
    sql
}

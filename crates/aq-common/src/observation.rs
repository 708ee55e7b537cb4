//! Observation records and the aggregates served over them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single measured value.
///
/// Identity is the `(time, station_id, parameter)` triple; an observation is
/// written once and never updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub time: DateTime<Utc>,
    pub station_id: String,
    pub parameter: String,
    pub unit: String,
    pub value: f64,
    pub quality: Option<String>,
    pub source: String,
}

impl Observation {
    pub fn key(&self) -> ObservationKey {
        ObservationKey {
            time: self.time,
            station_id: self.station_id.clone(),
            parameter: self.parameter.clone(),
        }
    }
}

/// Composite primary key of an observation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObservationKey {
    pub time: DateTime<Utc>,
    pub station_id: String,
    pub parameter: String,
}

/// One hourly bucket of observations for a station/parameter pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyAggregate {
    /// Start of the hour.
    pub time: DateTime<Utc>,
    pub station_id: String,
    pub parameter: String,
    pub unit: String,
    pub avg_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub n: i64,
}

/// Store-wide counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub station_count: i64,
    /// Observations recorded within the last 24 hours.
    pub observation_24h: i64,
}

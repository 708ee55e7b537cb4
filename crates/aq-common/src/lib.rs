//! Common types and utilities shared across all air-quality services.

pub mod error;
pub mod observation;
pub mod station;

pub use error::{AqError, AqResult};
pub use observation::{HourlyAggregate, Observation, ObservationKey, Summary};
pub use station::Station;

/// Provider tag written on stations ingested from OpenAQ.
pub const OPENAQ_PROVIDER: &str = "openaq";

/// Logical table holding one row per monitoring station.
pub const STATIONS_TABLE: &str = "stations";

/// Logical table holding one row per (time, station, parameter).
pub const OBSERVATIONS_TABLE: &str = "observations";

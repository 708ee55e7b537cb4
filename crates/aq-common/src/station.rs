//! Monitoring station records.

use serde::{Deserialize, Serialize};

/// A monitoring station as stored in the `stations` relation.
///
/// The identifier is unique per provider. Re-ingesting a known identifier
/// updates name, location, country and city; first-seen is never touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub station_id: String,
    pub name: Option<String>,
    pub provider: String,
    pub country: Option<String>,
    pub city: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation_m: Option<f64>,
}

impl Station {
    /// Build a station with only the required attributes set.
    pub fn new(
        station_id: impl Into<String>,
        provider: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            station_id: station_id.into(),
            name: None,
            provider: provider.into(),
            country: None,
            city: None,
            latitude,
            longitude,
            elevation_m: None,
        }
    }
}

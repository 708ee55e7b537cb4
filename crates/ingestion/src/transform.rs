//! Normalization of decoded measurements into station and observation rows.

use std::collections::BTreeMap;

use aq_common::{Observation, Station, OPENAQ_PROVIDER};

use crate::payload::{LocationRef, Measurement};

/// Rows derived from one page, ready for the writer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformedPage {
    /// One entry per station identifier, ordered by identifier.
    pub stations: Vec<Station>,
    /// One entry per input record, in input order.
    pub observations: Vec<Observation>,
}

/// Turns provider measurements into canonical records tagged with a
/// provider name.
#[derive(Debug, Clone)]
pub struct RecordTransformer {
    provider: String,
}

impl Default for RecordTransformer {
    fn default() -> Self {
        Self::new(OPENAQ_PROVIDER)
    }
}

impl RecordTransformer {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
        }
    }

    /// Later sightings of a station within the page replace earlier ones.
    pub fn transform(&self, records: &[Measurement]) -> TransformedPage {
        let mut stations = BTreeMap::new();
        let mut observations = Vec::with_capacity(records.len());

        for record in records {
            let station = self.station(&record.location);
            observations.push(Observation {
                time: record.time,
                station_id: station.station_id.clone(),
                parameter: record.parameter.clone(),
                unit: record.unit.clone(),
                value: record.value,
                quality: record.quality.clone(),
                source: self.provider.clone(),
            });
            stations.insert(station.station_id.clone(), station);
        }

        TransformedPage {
            stations: stations.into_values().collect(),
            observations,
        }
    }

    fn station(&self, location: &LocationRef) -> Station {
        match location {
            LocationRef::Embedded(location) => Station {
                name: location.name.clone(),
                country: location.country.clone(),
                city: location.city.clone(),
                ..Station::new(
                    location.id.clone(),
                    self.provider.clone(),
                    location.coordinates.latitude,
                    location.coordinates.longitude,
                )
            },
            LocationRef::Bare { id, coordinates } => Station {
                name: Some(format!("OpenAQ {}", id)),
                ..Station::new(
                    id.clone(),
                    self.provider.clone(),
                    coordinates.latitude,
                    coordinates.longitude,
                )
            },
        }
    }
}

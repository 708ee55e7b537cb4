//! Decoding of provider measurement records.
//!
//! The measurements endpoint reports a record's station in one of two shapes:
//! an embedded `location` object, or a bare identifier (`locationId`, falling
//! back to `location` when unset) with coordinates on the record itself. Both are
//! resolved here into a [`LocationRef`] so nothing downstream branches on
//! the raw JSON.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{IngestionError, Result};

/// Unit recorded when the provider omits one.
pub const UNKNOWN_UNIT: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A station described inline by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedLocation {
    pub id: String,
    pub name: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub coordinates: Coordinates,
}

/// Where a measurement's station came from.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationRef {
    Embedded(EmbeddedLocation),
    Bare { id: String, coordinates: Coordinates },
}

impl LocationRef {
    pub fn station_id(&self) -> &str {
        match self {
            LocationRef::Embedded(location) => &location.id,
            LocationRef::Bare { id, .. } => id,
        }
    }
}

/// One decoded provider record.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub time: DateTime<Utc>,
    pub parameter: String,
    pub unit: String,
    pub value: f64,
    pub quality: Option<String>,
    pub location: LocationRef,
}

impl Measurement {
    /// Decode one element of the response's `results` list.
    pub fn from_value(record: Value) -> Result<Self> {
        let raw: RawMeasurement = serde_json::from_value(record)
            .map_err(|e| IngestionError::MalformedRecord(e.to_string()))?;
        raw.resolve()
    }
}

#[derive(Debug, Deserialize)]
struct RawMeasurement {
    #[serde(rename = "locationId")]
    location_id: Option<Value>,
    location: Option<Value>,
    coordinates: Option<RawCoordinates>,
    parameter: Option<String>,
    value: Option<f64>,
    unit: Option<String>,
    date: Option<RawDate>,
    validation: Option<RawValidation>,
}

#[derive(Debug, Deserialize)]
struct RawCoordinates {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawDate {
    utc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawValidation {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLocation {
    id: Option<Value>,
    name: Option<String>,
    country: Option<String>,
    city: Option<String>,
    coordinates: Option<RawCoordinates>,
}

impl RawMeasurement {
    fn resolve(self) -> Result<Measurement> {
        let utc = self
            .date
            .and_then(|d| d.utc)
            .ok_or_else(|| malformed("missing date.utc"))?;
        let time = DateTime::parse_from_rfc3339(&utc)
            .map_err(|e| malformed(format!("invalid date.utc '{}': {}", utc, e)))?
            .with_timezone(&Utc);

        let parameter = self.parameter.ok_or_else(|| malformed("missing parameter"))?;
        let value = self.value.ok_or_else(|| malformed("missing value"))?;

        let location = match self.location_id.filter(is_set).or(self.location) {
            Some(Value::Object(fields)) => {
                let raw: RawLocation = serde_json::from_value(Value::Object(fields))
                    .map_err(|e| malformed(e.to_string()))?;
                let id = raw
                    .id
                    .as_ref()
                    .and_then(identifier)
                    .ok_or_else(|| malformed("embedded location without id"))?;
                LocationRef::Embedded(EmbeddedLocation {
                    coordinates: coordinates(raw.coordinates, &id)?,
                    id,
                    name: raw.name,
                    country: raw.country,
                    city: raw.city,
                })
            }
            Some(other) => {
                let id = identifier(&other)
                    .ok_or_else(|| malformed(format!("unusable location identifier {}", other)))?;
                LocationRef::Bare {
                    coordinates: coordinates(self.coordinates, &id)?,
                    id,
                }
            }
            None => return Err(malformed("record has no location")),
        };

        Ok(Measurement {
            time,
            parameter,
            unit: self.unit.unwrap_or_else(|| UNKNOWN_UNIT.to_string()),
            value,
            quality: self.validation.and_then(|v| v.status),
            location,
        })
    }
}

/// Whether `locationId` carries a value; null, `""`, `0`, `false` and empty
/// containers defer to `location`.
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// Render a scalar identifier as a string; numbers print in decimal.
fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coordinates(raw: Option<RawCoordinates>, station_id: &str) -> Result<Coordinates> {
    match raw {
        Some(RawCoordinates {
            latitude: Some(latitude),
            longitude: Some(longitude),
        }) => Ok(Coordinates {
            latitude,
            longitude,
        }),
        _ => Err(malformed(format!(
            "station {} has no coordinates",
            station_id
        ))),
    }
}

fn malformed(message: impl Into<String>) -> IngestionError {
    IngestionError::MalformedRecord(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use test_utils::fixtures::{bare_record, embedded_record};

    #[test]
    fn test_embedded_location() {
        let record = embedded_record(42, "Downtown", "2025-01-01T03:00:00Z", "pm25", 7.5);
        let m = Measurement::from_value(record).unwrap();

        assert_eq!(m.time, Utc.with_ymd_and_hms(2025, 1, 1, 3, 0, 0).unwrap());
        assert_eq!(m.quality.as_deref(), Some("verified"));
        match m.location {
            LocationRef::Embedded(location) => {
                assert_eq!(location.id, "42");
                assert_eq!(location.name.as_deref(), Some("Downtown"));
                assert_eq!(location.city.as_deref(), Some("Raleigh"));
            }
            other => panic!("expected embedded location, got {:?}", other),
        }
    }

    #[test]
    fn test_location_id_wins_over_location_name() {
        let record = bare_record("B", 40.71, -74.0, "2025-01-01T00:00:00Z", "o3", 0.03);
        let m = Measurement::from_value(record).unwrap();

        assert_eq!(
            m.location,
            LocationRef::Bare {
                id: "B".to_string(),
                coordinates: Coordinates {
                    latitude: 40.71,
                    longitude: -74.0
                },
            }
        );
        assert_eq!(m.quality, None);
    }

    #[test]
    fn test_numeric_bare_identifier() {
        let record = json!({
            "locationId": 8118,
            "coordinates": { "latitude": 1.0, "longitude": 2.0 },
            "parameter": "no2",
            "value": 3.0,
            "date": { "utc": "2025-01-01T00:00:00+00:00" }
        });
        let m = Measurement::from_value(record).unwrap();
        assert_eq!(m.location.station_id(), "8118");
        assert_eq!(m.unit, UNKNOWN_UNIT);
    }

    #[test]
    fn test_null_location_id_falls_back_to_location() {
        let record = json!({
            "locationId": null,
            "location": "Harbor",
            "coordinates": { "latitude": 1.0, "longitude": 2.0 },
            "parameter": "no2",
            "value": 3.0,
            "date": { "utc": "2025-01-01T00:00:00Z" }
        });
        let m = Measurement::from_value(record).unwrap();
        assert_eq!(m.location.station_id(), "Harbor");
    }

    #[test]
    fn test_unset_location_id_falls_back_to_location() {
        for unset in [json!(""), json!(0), json!(false)] {
            let record = json!({
                "locationId": unset,
                "location": "Harbor",
                "coordinates": { "latitude": 1.0, "longitude": 2.0 },
                "parameter": "no2",
                "value": 3.0,
                "date": { "utc": "2025-01-01T00:00:00Z" }
            });
            let m = Measurement::from_value(record).unwrap();
            assert_eq!(m.location.station_id(), "Harbor", "locationId {}", unset);
        }
    }

    #[test]
    fn test_unset_location_id_without_location_is_malformed() {
        let record = json!({
            "locationId": "",
            "coordinates": { "latitude": 1.0, "longitude": 2.0 },
            "parameter": "no2",
            "value": 3.0,
            "date": { "utc": "2025-01-01T00:00:00Z" }
        });
        assert!(matches!(
            Measurement::from_value(record),
            Err(IngestionError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_malformed_records() {
        let mut missing_coords = bare_record("B", 1.0, 2.0, "2025-01-01T00:00:00Z", "o3", 1.0);
        missing_coords["coordinates"] = Value::Null;

        let mut bad_date = bare_record("B", 1.0, 2.0, "yesterday", "o3", 1.0);
        bad_date["unit"] = json!("ppm");

        let mut text_value = bare_record("B", 1.0, 2.0, "2025-01-01T00:00:00Z", "o3", 1.0);
        text_value["value"] = json!("high");

        let no_location = json!({
            "parameter": "o3",
            "value": 1.0,
            "date": { "utc": "2025-01-01T00:00:00Z" }
        });

        for record in [missing_coords, bad_date, text_value, no_location] {
            assert!(matches!(
                Measurement::from_value(record),
                Err(IngestionError::MalformedRecord(_))
            ));
        }
    }
}

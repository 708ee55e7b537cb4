//! Provider payload fixtures.
//!
//! Builders for the two record shapes the measurements endpoint returns:
//! an embedded `location` object, or a bare `locationId` with coordinates on
//! the record itself.

use serde_json::{json, Value};

/// A record whose station is an embedded location object.
pub fn embedded_record(
    location_id: u64,
    name: &str,
    time: &str,
    parameter: &str,
    value: f64,
) -> Value {
    json!({
        "location": {
            "id": location_id,
            "name": name,
            "country": "US",
            "city": "Raleigh",
            "coordinates": { "latitude": 35.78, "longitude": -78.64 }
        },
        "parameter": parameter,
        "value": value,
        "unit": "µg/m³",
        "date": { "utc": time, "local": time },
        "validation": { "status": "verified" }
    })
}

/// A record that only carries a location identifier plus coordinates.
pub fn bare_record(
    location_id: &str,
    latitude: f64,
    longitude: f64,
    time: &str,
    parameter: &str,
    value: f64,
) -> Value {
    json!({
        "locationId": location_id,
        "location": "Some Street Monitor",
        "coordinates": { "latitude": latitude, "longitude": longitude },
        "parameter": parameter,
        "value": value,
        "unit": "ppm",
        "date": { "utc": time, "local": time }
    })
}

/// Wrap records in the endpoint's response envelope.
pub fn page(records: Vec<Value>) -> Value {
    json!({
        "meta": { "name": "openaq-api", "found": records.len() },
        "results": records
    })
}

/// An empty page: the pagination termination signal.
pub fn empty_page() -> Value {
    page(Vec::new())
}

/// Two readings for station `A` one hour apart plus one for station `B`
/// in the bare shape.
pub fn sample_records() -> Vec<Value> {
    vec![
        embedded_record(1, "Station A", "2025-01-01T00:00:00Z", "pm25", 10.5),
        embedded_record(1, "Station A (renamed)", "2025-01-01T01:00:00Z", "pm25", 11.0),
        bare_record("B", 40.71, -74.0, "2025-01-01T00:00:00Z", "o3", 0.031),
    ]
}

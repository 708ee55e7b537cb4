//! Service configuration.

use std::env;

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use aq_common::{AqError, AqResult};

/// Origins allowed when `API_CORS_ORIGINS` is unset.
pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:5173"];

/// Read `API_CORS_ORIGINS` (a JSON list of origins).
pub fn cors_origins_from_env() -> AqResult<Vec<String>> {
    match env::var("API_CORS_ORIGINS") {
        Ok(raw) => parse_cors_origins(&raw),
        Err(_) => Ok(DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect()),
    }
}

pub fn parse_cors_origins(raw: &str) -> AqResult<Vec<String>> {
    serde_json::from_str::<Vec<String>>(raw).map_err(|e| {
        AqError::InvalidConfig(format!(
            "API_CORS_ORIGINS must be a JSON list of origins: {}",
            e
        ))
    })
}

/// CORS restricted to `origins`, any method and header.
pub fn cors_layer(origins: &[String]) -> AqResult<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| AqError::InvalidConfig(format!("Invalid CORS origin: {}", origin)))
        })
        .collect::<AqResult<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}

//! Observation listing.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    Json,
};
use metrics::counter;

use aq_common::Observation;
use storage::ObservationFilter;

use crate::error::ApiResult;
use crate::state::AppState;

/// GET /observations - Filtered observations, newest first
///
/// Query parameters: `station_id`, `parameter`, `start`, `end` (RFC 3339)
/// and `limit` (default 1000, at most 10000).
pub async fn list_observations_handler(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<ObservationFilter>, QueryRejection>,
) -> ApiResult<Json<Vec<Observation>>> {
    counter!("api_requests_total", "endpoint" => "observations").increment(1);
    let Query(filter) = query?;
    Ok(Json(state.queries.list_observations(&filter).await?))
}

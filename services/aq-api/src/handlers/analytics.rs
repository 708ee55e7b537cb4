//! Hourly aggregates.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    Json,
};
use metrics::counter;

use aq_common::HourlyAggregate;
use storage::HourlyFilter;

use crate::error::ApiResult;
use crate::state::AppState;

/// GET /analytics/hourly - Hourly mean/min/max/count for a station and parameter
///
/// `station_id` and `parameter` are required; `start` and `end` bound the
/// raw observation times.
pub async fn hourly_handler(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<HourlyFilter>, QueryRejection>,
) -> ApiResult<Json<Vec<HourlyAggregate>>> {
    counter!("api_requests_total", "endpoint" => "analytics_hourly").increment(1);
    let Query(filter) = query?;
    Ok(Json(state.queries.hourly(&filter).await?))
}

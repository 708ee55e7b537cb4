//! Station listing.

use std::sync::Arc;

use axum::{extract::Extension, Json};
use metrics::counter;

use aq_common::Station;

use crate::error::ApiResult;
use crate::state::AppState;

/// GET /stations - Up to 1000 stations ordered by identifier
pub async fn list_stations_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<Vec<Station>>> {
    counter!("api_requests_total", "endpoint" => "stations").increment(1);
    Ok(Json(state.queries.list_stations().await?))
}

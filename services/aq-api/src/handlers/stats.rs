//! Summary statistics.

use std::sync::Arc;

use axum::{extract::Extension, Json};
use chrono::Utc;
use metrics::counter;

use aq_common::Summary;

use crate::error::ApiResult;
use crate::state::AppState;

/// GET /stats/summary - Station count and observations in the last 24 hours
pub async fn summary_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<Summary>> {
    counter!("api_requests_total", "endpoint" => "stats_summary").increment(1);
    Ok(Json(state.queries.summary(Utc::now()).await?))
}

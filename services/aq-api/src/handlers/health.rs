//! Root, health and metrics handlers.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct RootResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// `primary` or `fallback`.
    pub storage: &'static str,
}

/// GET / - Service banner
pub async fn root_handler() -> Json<RootResponse> {
    counter!("api_requests_total", "endpoint" => "root").increment(1);
    Json(RootResponse {
        status: "ok",
        message: "Air Quality API",
    })
}

/// GET /health - Store round-trip plus which store is live
pub async fn health_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<HealthResponse>> {
    counter!("api_requests_total", "endpoint" => "health").increment(1);
    state.storage.ping().await?;

    Ok(Json(HealthResponse {
        status: "ok",
        storage: state.storage.mode().label(),
    }))
}

/// GET /metrics - Prometheus metrics
pub async fn metrics_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let body = state
        .prometheus
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}

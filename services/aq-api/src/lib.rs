//! Air-quality query service library.
//!
//! Read-only HTTP endpoints over the stations and observations relations.
//! Every query goes through [`storage::Queries`], so the service works the
//! same against the primary store and the seeded fallback.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the service router with all routes and middleware.
pub fn app(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(handlers::health::root_handler))
        .route("/health", get(handlers::health::health_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        .route("/stations", get(handlers::stations::list_stations_handler))
        .route(
            "/observations",
            get(handlers::observations::list_observations_handler),
        )
        .route("/stats/summary", get(handlers::stats::summary_handler))
        .route("/analytics/hourly", get(handlers::analytics::hourly_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

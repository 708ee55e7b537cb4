//! HTTP request handlers for the query service.

pub mod analytics;
pub mod health;
pub mod observations;
pub mod stations;
pub mod stats;

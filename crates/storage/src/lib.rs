//! Storage layer for the air-quality services.
//!
//! Provides:
//! - Primary (PostgreSQL) connectivity with a self-seeding SQLite fallback
//! - Schema-aware table resolution via [`StorageMode`]
//! - Transactional upserts for stations and observations
//! - Read queries for the HTTP API

pub mod adapter;
pub mod config;
pub mod mode;
pub mod queries;
pub mod seed;
pub mod session;
pub mod writer;

pub use adapter::{Backend, StorageAdapter};
pub use config::StorageConfig;
pub use mode::StorageMode;
pub use queries::{HourlyFilter, ObservationFilter, Queries};
pub use session::Session;
pub use writer::UpsertWriter;

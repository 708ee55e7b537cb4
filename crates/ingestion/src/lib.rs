//! Air-quality measurement ingestion.
//!
//! Pulls paginated measurements from the OpenAQ `/measurements` endpoint and
//! persists them through the storage crate, one transaction per page.
//!
//! # Architecture
//!
//! - [`RemoteClient`] fetches numbered pages; tests swap in any other
//!   [`PageSource`]
//! - [`payload`] resolves both station shapes into [`LocationRef`]
//! - [`RecordTransformer`] dedupes stations and tags observations
//! - [`Pipeline`] runs the loop under explicit pagination and retry policies

pub mod client;
pub mod error;
pub mod payload;
pub mod pipeline;
pub mod transform;

// Re-exports
pub use client::{ClientConfig, Page, PageSource, RemoteClient, DEFAULT_BASE_URL, PAGE_SIZE};
pub use error::{IngestionError, Result};
pub use payload::{Coordinates, EmbeddedLocation, LocationRef, Measurement};
pub use pipeline::{IngestReport, PaginationPolicy, Pipeline, RetryPolicy};
pub use transform::{RecordTransformer, TransformedPage};

//! Shared test utilities for the air-quality workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Provider payload fixtures (OpenAQ `/measurements` shapes)
//! - Temporary locations for fallback stores
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, TempStore};
//! ```

pub mod fixtures;
pub mod paths;

pub use paths::*;

//! standsync library
//!
//! Aggregates per-participant results across several contest standings,
//! filters the roster against configurable thresholds, and produces the
//! combined report plus the sheet-cleaning plan. Exposed as a library so
//! the binary and the integration tests share one pipeline.

pub mod config;
pub mod export;
pub mod models;
pub mod pipeline;
pub mod scrapers;
pub mod sheets;

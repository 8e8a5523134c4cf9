//! # Brokerwatch Analytics Engine
//!
//! This crate turns recorded account valuations into a cash-flow-adjusted,
//! compounding performance series.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of external systems.
//!   It depends only on `core-types` (Layer 0). Transactions arrive through the
//!   `TransactionFetcher` trait, which the database crate implements.
//! - **Stateless Calculation:** The `PerformanceEngine` holds no state between calls. The
//!   same valuations and transactions always produce the same series.
//!
//! ## Public API
//!
//! - `PerformanceEngine`: aggregation, alignment and the daily return formula.
//! - `TransactionFetcher`: the query capability the engine needs from storage.
//! - `PerformancePoint`: the caller-facing row (range performance as a delta from 1).
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::PerformanceEngine;
pub use error::AnalyticsError;
pub use fetcher::TransactionFetcher;
pub use report::{PerformancePoint, RangeSummary};

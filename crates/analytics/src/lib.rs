//! # Tradewind Analytics Engine
//!
//! This crate turns a list of closed trades into aggregate performance
//! statistics. It acts as the "unbiased judge" of the system.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It depends only on `core-types`.
//! - **Stateless Calculation:** The `AnalyticsEngine` is a stateless calculator. Stats are
//!   always recomputed in full from the trade list, never updated incrementally, so the
//!   same trades always yield identical stats.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: The main struct that contains the calculation logic.
//! - `BacktestStats`: The aggregate over all closed trades of one run.
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use report::BacktestStats;

//! # Tradewind Core Types
//!
//! Layer 0 of the workspace. Every other crate speaks in these types: price
//! bars, strategy signals, simulated trades, and the order intents handed to
//! the broker layer.

pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{ExitReason, OrderSide, Signal, StrategyId};
pub use error::CoreError;
pub use structs::{Bar, OrderIntent, Trade};

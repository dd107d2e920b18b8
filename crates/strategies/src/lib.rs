//! # Tradewind Strategy Library
//!
//! This crate contains the signal logic for the Tradewind system. It defines a
//! universal `Strategy` capability and provides several concrete implementations.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of brokers,
//!   storage, or execution. It depends only on `core-types` and `configuration`.
//! - **Strategy Agnostic Engine:** By using the `Strategy` trait, higher-level crates
//!   like the `backtester` and `optimizer` can operate on any strategy without knowing its
//!   internal details.
//! - **Extensibility:** Adding a new strategy involves creating a new module, implementing
//!   the `Strategy` trait, and adding it to the `StrategyId` enum and `factory`.

// Declare all the modules that constitute this crate.
pub mod error;
pub mod factory;
pub mod feed;
pub mod ma_crossover;
pub mod macd_trend;
pub mod rsi_reversion;

// Re-export the key components to create a clean, public-facing API.
pub use error::StrategyError;
pub use factory::create_strategy;
pub use feed::BarFeed;
pub use ma_crossover::MACrossover;
pub use macd_trend::MacdTrend;
pub use rsi_reversion::RsiReversion;

// Re-export StrategyId from core_types
pub use core_types::StrategyId;

use core_types::{Bar, Signal};
use rust_decimal::Decimal;

/// The capability every trading strategy provides.
///
/// `evaluate` takes `&mut self` because most strategies keep indicator state
/// between calls. The `Send + Sync` bounds allow strategies to be built and
/// run on the optimizer's worker threads.
pub trait Strategy: Send + Sync {
    /// Human-readable name, used as the bandit arm name and in logs.
    fn name(&self) -> &str;

    /// Decides what to do on the newest bar.
    ///
    /// # Arguments
    ///
    /// * `bars` - Every bar seen so far, oldest first. Each call receives the
    ///   previous history plus zero or more new bars; the history never shrinks.
    ///
    /// # Returns
    ///
    /// * `Ok(Signal::Buy | Signal::Sell)` - open a position at the newest bar.
    /// * `Ok(Signal::None)` - no action on this bar.
    /// * `Err(StrategyError)` - if an error occurs during evaluation.
    fn evaluate(&mut self, bars: &[Bar]) -> Result<Signal, StrategyError>;

    /// Called after a position opened on this strategy's signal closes.
    ///
    /// The default does nothing; adaptive strategies override it.
    fn notify_result(&mut self, _win: bool, _pnl: Decimal) {}
}

/// Converts a `Decimal` price into the `f64` the `ta` crate expects.
pub(crate) fn to_f64(value: Decimal) -> Result<f64, StrategyError> {
    use rust_decimal::prelude::ToPrimitive;
    value
        .to_f64()
        .ok_or_else(|| StrategyError::IndicatorError(format!("cannot convert {} to f64", value)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, TimeZone, Utc};
    use core_types::Bar;
    use rust_decimal::Decimal;
    use rust_decimal::prelude::FromPrimitive;

    /// Builds bars whose close follows `closes`, with a 0.5 wick each side.
    pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let close = Decimal::from_f64(c).unwrap();
                let wick = Decimal::new(5, 1);
                Bar {
                    timestamp: start + Duration::hours(i as i64),
                    open: close,
                    high: close + wick,
                    low: close - wick,
                    close,
                }
            })
            .collect()
    }
}

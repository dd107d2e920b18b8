//! # Tradewind Risk Management
//!
//! Turns an entry/stop pair into an order size. The fraction of equity put at
//! risk shrinks as the account falls further below its equity peak.
//!
//! - `position_size`: the stateless sizing rule.
//! - `DrawdownState` / `RiskTiers`: drawdown tracking and bracket lookup.
//! - `AdaptiveRiskManager`: the stateful `RiskManager` used by the engine.

pub mod adaptive_manager;
pub mod drawdown;
pub mod error;
pub mod sizer;

pub use adaptive_manager::AdaptiveRiskManager;
pub use drawdown::DrawdownState;
pub use error::RiskError;
pub use sizer::{RiskTiers, position_size};

use core_types::{OrderIntent, OrderSide};
use rust_decimal::Decimal;

/// The core trait for any risk management module.
///
/// A `RiskManager` validates a proposed entry against the account's current
/// state and converts it into a concrete, sized `OrderIntent`.
pub trait RiskManager: Send {
    fn evaluate_entry(
        &self,
        instrument: &str,
        direction: OrderSide,
        entry_price: Decimal,
        stop_price: Decimal,
        target_price: Decimal,
    ) -> Result<OrderIntent, RiskError>;
}

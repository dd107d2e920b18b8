use crate::enums::{ExitReason, OrderSide};
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One OHLC price bar. Bars are consumed in time order and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

/// A simulated trade. Mutable while open, frozen once `close` has been called.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub direction: OrderSide,
    pub entry_index: usize,
    pub entry_price: Decimal,
    pub stop_price: Decimal,
    pub target_price: Decimal,
    pub max_duration_bars: usize,
    pub exit_index: Option<usize>,
    pub exit_price: Option<Decimal>,
    pub exit_reason: Option<ExitReason>,
    pub pnl_price_units: Option<Decimal>,
}

impl Trade {
    pub fn open(
        direction: OrderSide,
        entry_index: usize,
        entry_price: Decimal,
        stop_price: Decimal,
        target_price: Decimal,
        max_duration_bars: usize,
    ) -> Self {
        Self {
            direction,
            entry_index,
            entry_price,
            stop_price,
            target_price,
            max_duration_bars,
            exit_index: None,
            exit_price: None,
            exit_reason: None,
            pnl_price_units: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.exit_index.is_none()
    }

    /// Number of bars the trade has been held as of `index`.
    pub fn bars_held(&self, index: usize) -> usize {
        index.saturating_sub(self.entry_index)
    }

    /// Fixes the exit and computes the signed PnL in price units.
    pub fn close(
        &mut self,
        exit_index: usize,
        exit_price: Decimal,
        reason: ExitReason,
    ) -> Result<Decimal, CoreError> {
        if let Some(index) = self.exit_index {
            return Err(CoreError::TradeAlreadyClosed(index));
        }
        let pnl = (exit_price - self.entry_price) * self.direction.sign();
        self.exit_index = Some(exit_index);
        self.exit_price = Some(exit_price);
        self.exit_reason = Some(reason);
        self.pnl_price_units = Some(pnl);
        Ok(pnl)
    }

    /// Realized PnL, zero while the trade is still open.
    pub fn pnl(&self) -> Decimal {
        self.pnl_price_units.unwrap_or(Decimal::ZERO)
    }

    pub fn is_win(&self) -> bool {
        self.pnl() > Decimal::ZERO
    }
}

/// What the core hands to the broker layer for an accepted signal.
///
/// Order placement, price rounding and fill confirmation are the broker's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub instrument: String,
    pub direction: OrderSide,
    pub entry_price_hint: Decimal,
    pub stop_price: Decimal,
    pub target_price: Decimal,
    pub units: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn short_trade_pnl_is_signed_by_direction() {
        let mut trade = Trade::open(OrderSide::Sell, 5, dec!(1.2000), dec!(1.2100), dec!(1.1800), 20);
        let pnl = trade.close(9, dec!(1.1800), ExitReason::Target).unwrap();
        assert_eq!(pnl, dec!(0.0200));
        assert!(trade.is_win());
        assert!(!trade.is_open());
    }

    #[test]
    fn closing_twice_is_rejected() {
        let mut trade = Trade::open(OrderSide::Buy, 0, dec!(100), dec!(98), dec!(104), 0);
        trade.close(3, dec!(98), ExitReason::Stop).unwrap();
        assert!(trade.close(4, dec!(99), ExitReason::Timeout).is_err());
        assert_eq!(trade.pnl(), dec!(-2));
    }
}

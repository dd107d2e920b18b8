use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Running equity peak and the latest equity observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawdownState {
    pub peak_equity: Decimal,
    pub current_equity: Decimal,
}

impl DrawdownState {
    pub fn new(initial_equity: Decimal) -> Self {
        Self {
            peak_equity: initial_equity,
            current_equity: initial_equity,
        }
    }

    /// Records a new equity observation. The peak only ever moves up.
    pub fn record_equity(&mut self, equity: Decimal) {
        self.current_equity = equity;
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
    }

    /// Fractional distance below the peak, never negative.
    pub fn drawdown_pct(&self) -> Decimal {
        if self.peak_equity <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        ((self.peak_equity - self.current_equity) / self.peak_equity).max(Decimal::ZERO)
    }
}

use crate::RiskManager;
use crate::drawdown::DrawdownState;
use crate::error::RiskError;
use crate::sizer::{RiskTiers, position_size};
use configuration::RiskManagement;
use core_types::{OrderIntent, OrderSide};
use rust_decimal::Decimal;

/// Drawdown-aware position sizing.
///
/// Owns the account's `DrawdownState`; every equity update goes through
/// `record_equity`, so there is exactly one writer.
#[derive(Debug, Clone)]
pub struct AdaptiveRiskManager {
    state: DrawdownState,
    tiers: RiskTiers,
    max_units: u64,
    reoptimize_drawdown_pct: Decimal,
}

impl AdaptiveRiskManager {
    pub fn new(params: &RiskManagement, initial_equity: Decimal) -> Result<Self, RiskError> {
        if params.max_units == 0 {
            return Err(RiskError::InvalidParameters(
                "max_units must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            state: DrawdownState::new(initial_equity),
            tiers: RiskTiers::from_config(params)?,
            max_units: params.max_units,
            reoptimize_drawdown_pct: params.reoptimize_drawdown_pct,
        })
    }

    pub fn record_equity(&mut self, equity: Decimal) {
        self.state.record_equity(equity);
        tracing::debug!(
            equity = %equity,
            peak = %self.state.peak_equity,
            drawdown = %self.state.drawdown_pct(),
            "Equity recorded"
        );
    }

    pub fn state(&self) -> &DrawdownState {
        &self.state
    }

    pub fn current_risk_fraction(&self) -> Decimal {
        self.tiers.risk_fraction(self.state.drawdown_pct())
    }

    /// Units for an entry/stop pair at the current equity and drawdown.
    pub fn size(&self, entry_price: Decimal, stop_price: Decimal) -> Result<u64, RiskError> {
        position_size(
            self.state.current_equity,
            entry_price,
            stop_price,
            self.current_risk_fraction(),
            self.max_units,
        )
    }

    /// True once drawdown has moved past the re-optimisation trigger.
    pub fn should_reoptimize(&self) -> bool {
        self.state.drawdown_pct() > self.reoptimize_drawdown_pct
    }
}

impl RiskManager for AdaptiveRiskManager {
    fn evaluate_entry(
        &self,
        instrument: &str,
        direction: OrderSide,
        entry_price: Decimal,
        stop_price: Decimal,
        target_price: Decimal,
    ) -> Result<OrderIntent, RiskError> {
        // --- 1. Validation ---
        if entry_price <= Decimal::ZERO {
            return Err(RiskError::InvalidEntryPrice(entry_price));
        }
        if self.state.current_equity <= Decimal::ZERO {
            return Err(RiskError::InsufficientEquity(self.state.current_equity));
        }
        let stop_on_loss_side = match direction {
            OrderSide::Buy => stop_price <= entry_price,
            OrderSide::Sell => stop_price >= entry_price,
        };
        if !stop_on_loss_side {
            return Err(RiskError::InvalidStopLoss(format!(
                "{} entry at {} with stop {}",
                direction, entry_price, stop_price
            )));
        }

        // --- 2. Sizing ---
        let units = self.size(entry_price, stop_price)?;
        if units == 0 {
            return Err(RiskError::ZeroUnits(self.state.current_equity * self.current_risk_fraction()));
        }

        Ok(OrderIntent {
            instrument: instrument.to_string(),
            direction,
            entry_price_hint: entry_price,
            stop_price,
            target_price,
            units,
        })
    }
}

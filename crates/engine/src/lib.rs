use allocator::SharedAllocator;
use backtester::{SimulationParams, average_true_range};
use core_types::{Bar, OrderIntent, OrderSide, Signal};
use risk::{AdaptiveRiskManager, RiskError, RiskManager};
use rust_decimal::Decimal;
use std::sync::Arc;

pub mod broker;
pub mod error;

pub use broker::{Broker, PaperBroker};
pub use error::EngineError;

/// The central orchestrator between strategies and the broker.
///
/// Turns signals into sized order intents, and feeds closed-trade results back
/// into both the drawdown tracker and the strategy allocator.
pub struct ExecutionCoordinator {
    // --- Single-writer state ---
    risk_manager: AdaptiveRiskManager,

    // --- Shared components ---
    allocator: SharedAllocator,
    broker: Arc<dyn Broker>,
}

impl ExecutionCoordinator {
    pub fn new(risk_manager: AdaptiveRiskManager, allocator: SharedAllocator, broker: Arc<dyn Broker>) -> Self {
        Self {
            risk_manager,
            allocator,
            broker,
        }
    }

    pub fn risk_manager(&self) -> &AdaptiveRiskManager {
        &self.risk_manager
    }

    /// The strategy the allocator would run next.
    pub fn next_strategy(&self) -> Result<String, EngineError> {
        Ok(self.allocator.select()?)
    }

    /// Builds an order intent for `signal` on the latest bar of `bars`.
    ///
    /// Stop and target sit `sl_mult` and `tp_mult` ATRs from the last close.
    /// Returns `None` for a flat signal, when ATR is not yet available, or
    /// when the risk budget cannot buy a single unit.
    pub fn on_signal(
        &self,
        instrument: &str,
        signal: Signal,
        bars: &[Bar],
        levels: &SimulationParams,
    ) -> Result<Option<OrderIntent>, EngineError> {
        let Some(direction) = signal.side() else {
            return Ok(None);
        };
        let Some(last) = bars.last() else {
            return Ok(None);
        };
        let atr = match average_true_range(bars, bars.len() - 1, levels.atr_period) {
            Some(atr) if atr > Decimal::ZERO => atr,
            _ => {
                tracing::debug!(instrument, bars = bars.len(), "ATR unavailable; signal ignored");
                return Ok(None);
            }
        };

        let entry = last.close;
        let (stop, target) = match direction {
            OrderSide::Buy => (entry - levels.sl_mult * atr, entry + levels.tp_mult * atr),
            OrderSide::Sell => (entry + levels.sl_mult * atr, entry - levels.tp_mult * atr),
        };

        match self.risk_manager.evaluate_entry(instrument, direction, entry, stop, target) {
            Ok(intent) => Ok(Some(intent)),
            Err(e @ (RiskError::DegenerateStop { .. } | RiskError::ZeroUnits(_))) => {
                tracing::warn!(instrument, error = %e, "Entry skipped by risk manager");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Hands an accepted intent to the broker.
    pub fn dispatch(&self, intent: &OrderIntent) -> Result<(), EngineError> {
        self.broker.submit(intent)
    }

    /// Records a closed trade's result.
    ///
    /// Returns `true` when drawdown now exceeds the re-optimisation trigger.
    pub fn on_trade_closed(&mut self, strategy_name: &str, pnl: Decimal, equity: Decimal) -> Result<bool, EngineError> {
        // Unknown arms are rejected before any equity is recorded.
        self.allocator.update(strategy_name, pnl)?;
        self.risk_manager.record_equity(equity);

        let reoptimize = self.risk_manager.should_reoptimize();
        if reoptimize {
            tracing::warn!(
                drawdown = %self.risk_manager.state().drawdown_pct(),
                "Drawdown past re-optimisation trigger"
            );
        }
        Ok(reoptimize)
    }
}

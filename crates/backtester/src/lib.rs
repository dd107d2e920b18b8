//! # Tradewind Backtester
//!
//! Replays a bar series through one strategy and records the resulting
//! trades. ATR-scaled stops and targets, an optional timeout and an optional
//! trailing stop decide every exit. Only one trade is ever open.

use analytics::{AnalyticsEngine, BacktestStats};
use configuration::Simulation;
use core_types::{Bar, ExitReason, OrderSide, Trade};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strategies::Strategy;

pub mod atr;
pub mod error;

pub use atr::average_true_range;
pub use error::BacktestError;

/// Per-run simulator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub atr_period: usize,
    pub sl_mult: Decimal,
    pub tp_mult: Decimal,
    /// 0 disables the timeout.
    pub max_duration_bars: usize,
    pub warmup: usize,
    pub trail_atr_mult: Option<Decimal>,
}

impl SimulationParams {
    /// Single-backtest settings straight from the `[simulation]` config table.
    pub fn from_config(simulation: &Simulation) -> Self {
        Self {
            atr_period: simulation.atr_period,
            sl_mult: simulation.sl_mult,
            tp_mult: simulation.tp_mult,
            max_duration_bars: simulation.max_duration_bars,
            warmup: simulation.warmup,
            trail_atr_mult: None,
        }
    }

    fn validate(&self) -> Result<(), BacktestError> {
        if self.atr_period == 0 {
            return Err(BacktestError::InvalidParameters("atr_period must be greater than 0".to_string()));
        }
        if self.sl_mult <= Decimal::ZERO || self.tp_mult <= Decimal::ZERO {
            return Err(BacktestError::InvalidParameters(format!(
                "sl_mult ({}) and tp_mult ({}) must be positive",
                self.sl_mult, self.tp_mult
            )));
        }
        if matches!(self.trail_atr_mult, Some(trail) if trail <= Decimal::ZERO) {
            return Err(BacktestError::InvalidParameters("trail_atr_mult must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self::from_config(&Simulation::default())
    }
}

/// Everything one simulation produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRun {
    pub stats: BacktestStats,
    pub trades: Vec<Trade>,
}

/// The open trade plus the ATR it was sized with, which the trailing stop reuses.
struct OpenPosition {
    trade: Trade,
    entry_atr: Decimal,
}

/// The main backtesting engine.
///
/// Holds no per-run state, so one instance can serve many threads.
#[derive(Debug, Default, Clone)]
pub struct Backtester {
    analytics_engine: AnalyticsEngine,
}

impl Backtester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `strategy` over `bars` and returns the closed trades and their stats.
    ///
    /// Bars before `warmup` only prime the strategy. After that, each bar first
    /// resolves the open trade (timeout, then stop/target with the stop winning
    /// a same-bar tie), and then, if flat and not on the final bar, asks the
    /// strategy for an entry at the bar's close.
    pub fn simulate(
        &self,
        bars: &[Bar],
        strategy: &mut dyn Strategy,
        params: &SimulationParams,
    ) -> Result<BacktestRun, BacktestError> {
        params.validate()?;
        if bars.is_empty() && params.warmup > 0 {
            return Err(BacktestError::EmptyData(params.warmup));
        }
        if bars.len() < params.warmup + params.atr_period + 1 {
            tracing::debug!(
                bars = bars.len(),
                warmup = params.warmup,
                atr_period = params.atr_period,
                "Not enough bars to trade; returning empty run"
            );
            return Ok(BacktestRun { stats: BacktestStats::new(), trades: Vec::new() });
        }

        let last_index = bars.len() - 1;
        let mut trades = Vec::new();
        let mut open: Option<OpenPosition> = None;

        for (i, bar) in bars.iter().enumerate() {
            // --- 1. WARMUP ---
            if i < params.warmup {
                strategy.evaluate(&bars[..=i])?;
                continue;
            }

            // --- 2. EXIT CHECK ---
            if let Some(mut position) = open.take() {
                match exit_for_bar(&position.trade, bar, i) {
                    Some((price, reason)) => {
                        trades.push(close_trade(position.trade, i, price, reason, strategy)?);
                    }
                    None => {
                        if let Some(trail) = params.trail_atr_mult {
                            ratchet_stop(&mut position.trade, bar.close, trail * position.entry_atr);
                        }
                        open = Some(position);
                    }
                }
            }

            // --- 3. ENTRY ---
            if open.is_some() || i == last_index {
                continue;
            }
            let atr = match average_true_range(bars, i, params.atr_period) {
                Some(atr) if atr > Decimal::ZERO => atr,
                _ => continue,
            };
            let Some(direction) = strategy.evaluate(&bars[..=i])?.side() else {
                continue;
            };

            let entry = bar.close;
            let stop_distance = params.sl_mult * atr;
            let target_distance = params.tp_mult * atr;
            let (stop, target) = match direction {
                OrderSide::Buy => (entry - stop_distance, entry + target_distance),
                OrderSide::Sell => (entry + stop_distance, entry - target_distance),
            };
            tracing::trace!(index = i, %direction, %entry, %stop, %target, "Opening trade");
            open = Some(OpenPosition {
                trade: Trade::open(direction, i, entry, stop, target, params.max_duration_bars),
                entry_atr: atr,
            });
        }

        // --- 4. END OF DATA ---
        if let Some(position) = open.take() {
            let close = bars[last_index].close;
            trades.push(close_trade(position.trade, last_index, close, ExitReason::EndOfData, strategy)?);
        }

        let stats = self.analytics_engine.calculate(&trades)?;
        tracing::debug!(
            strategy = strategy.name(),
            trades = stats.trade_count,
            total_pnl = %stats.total_pnl,
            "Simulation complete"
        );
        Ok(BacktestRun { stats, trades })
    }
}

/// Decides whether `bar` closes `trade`, and at what price.
fn exit_for_bar(trade: &Trade, bar: &Bar, index: usize) -> Option<(Decimal, ExitReason)> {
    if trade.max_duration_bars > 0 && trade.bars_held(index) >= trade.max_duration_bars {
        return Some((bar.close, ExitReason::Timeout));
    }

    let (stop_hit, target_hit) = match trade.direction {
        OrderSide::Buy => (bar.low <= trade.stop_price, bar.high >= trade.target_price),
        OrderSide::Sell => (bar.high >= trade.stop_price, bar.low <= trade.target_price),
    };
    if stop_hit {
        Some((trade.stop_price, ExitReason::Stop))
    } else if target_hit {
        Some((trade.target_price, ExitReason::Target))
    } else {
        None
    }
}

/// Moves the stop toward price, never away from it.
fn ratchet_stop(trade: &mut Trade, close: Decimal, distance: Decimal) {
    trade.stop_price = match trade.direction {
        OrderSide::Buy => trade.stop_price.max(close - distance),
        OrderSide::Sell => trade.stop_price.min(close + distance),
    };
}

fn close_trade(
    mut trade: Trade,
    index: usize,
    price: Decimal,
    reason: ExitReason,
    strategy: &mut dyn Strategy,
) -> Result<Trade, BacktestError> {
    let pnl = trade.close(index, price, reason)?;
    strategy.notify_result(pnl > Decimal::ZERO, pnl);
    tracing::trace!(index, %price, ?reason, %pnl, "Trade closed");
    Ok(trade)
}

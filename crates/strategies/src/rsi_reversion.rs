use crate::error::StrategyError;
use crate::feed::BarFeed;
use crate::{Strategy, to_f64};
use configuration::RsiReversionParams;
use core_types::{Bar, Signal};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use ta::Next;
use ta::indicators::RelativeStrengthIndex as Rsi;

/// Closed trades remembered for the adaptive band adjustment.
const RESULT_WINDOW: usize = 20;
/// Band shift applied per adjustment, in RSI points.
const BAND_STEP: Decimal = dec!(2);

/// Fades RSI extremes: buys when RSI climbs back above the oversold line,
/// sells when it drops back below the overbought line.
///
/// The bands adapt to results: over the last 20 closed trades, a win rate
/// below 40% widens them and a win rate above 65% narrows them (never past
/// 55/45).
pub struct RsiReversion {
    feed: BarFeed,
    rsi: Rsi,
    min_history: usize,
    overbought: Decimal,
    oversold: Decimal,
    prev_rsi: Option<Decimal>,
    recent_results: VecDeque<bool>,
    last_signal: Signal,
}

impl RsiReversion {
    pub fn new(params: RsiReversionParams) -> Result<Self, StrategyError> {
        if params.oversold >= params.overbought {
            return Err(StrategyError::InvalidParameters(
                "oversold level must be below overbought level".to_string(),
            ));
        }
        let rsi = Rsi::new(params.rsi_period)
            .map_err(|e| StrategyError::InvalidParameters(format!("Failed to initialize RSI: {:?}", e)))?;

        Ok(Self {
            feed: BarFeed::new(),
            rsi,
            min_history: params.rsi_period + 2,
            overbought: params.overbought,
            oversold: params.oversold,
            prev_rsi: None,
            recent_results: VecDeque::with_capacity(RESULT_WINDOW),
            last_signal: Signal::None,
        })
    }

    /// Current (overbought, oversold) levels.
    pub fn bands(&self) -> (Decimal, Decimal) {
        (self.overbought, self.oversold)
    }

    fn step(&mut self, bar: &Bar, history_len: usize) -> Result<Signal, StrategyError> {
        let value = self.rsi.next(to_f64(bar.close)?);
        let rsi = Decimal::from_f64(value)
            .ok_or_else(|| StrategyError::IndicatorError(format!("RSI produced {}", value)))?;

        let signal = match self.prev_rsi {
            Some(prev) if history_len >= self.min_history => {
                if prev > self.overbought && rsi < self.overbought {
                    Signal::Sell
                } else if prev < self.oversold && rsi > self.oversold {
                    Signal::Buy
                } else {
                    Signal::None
                }
            }
            _ => Signal::None,
        };

        self.prev_rsi = Some(rsi);
        Ok(signal)
    }
}

impl Strategy for RsiReversion {
    fn name(&self) -> &str {
        "RsiReversion"
    }

    fn evaluate(&mut self, bars: &[Bar]) -> Result<Signal, StrategyError> {
        let already_seen = self.feed.consumed();
        let fresh = self.feed.unseen(bars)?;
        for (offset, bar) in fresh.iter().enumerate() {
            self.last_signal = self.step(bar, already_seen + offset + 1)?;
        }
        Ok(self.last_signal)
    }

    fn notify_result(&mut self, win: bool, _pnl: Decimal) {
        if self.recent_results.len() == RESULT_WINDOW {
            self.recent_results.pop_front();
        }
        self.recent_results.push_back(win);
        if self.recent_results.len() < RESULT_WINDOW {
            return;
        }

        let wins = self.recent_results.iter().filter(|w| **w).count();
        let win_rate = Decimal::from(wins) / Decimal::from(RESULT_WINDOW);
        if win_rate < dec!(0.40) {
            self.overbought += BAND_STEP;
            self.oversold -= BAND_STEP;
        } else if win_rate > dec!(0.65) {
            self.overbought = (self.overbought - BAND_STEP).max(dec!(55));
            self.oversold = (self.oversold + BAND_STEP).min(dec!(45));
        }
        tracing::debug!(%win_rate, overbought = %self.overbought, oversold = %self.oversold, "RSI bands adjusted");
    }
}

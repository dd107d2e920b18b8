use crate::error::StrategyError;
use crate::feed::BarFeed;
use crate::{Strategy, to_f64};
use configuration::MACrossoverParams;
use core_types::{Bar, Signal};
use ta::Next;
use ta::indicators::SimpleMovingAverage as Sma;

/// The Triple Moving Average Crossover strategy.
pub struct MACrossover {
    feed: BarFeed,
    min_history: usize,
    ma_fast: Sma,
    ma_slow: Sma,
    trend_filter: Sma,
    // State: The previous values of the fast and slow MAs to detect a crossover event.
    prev_fast_ma: Option<f64>,
    prev_slow_ma: Option<f64>,
    last_signal: Signal,
}

impl MACrossover {
    /// Creates a new `MACrossover` instance with the given parameters.
    ///
    /// It performs validation to ensure the parameters are logical.
    pub fn new(params: MACrossoverParams) -> Result<Self, StrategyError> {
        // Validation: Ensure periods are logical.
        if params.ma_fast_period >= params.ma_slow_period {
            return Err(StrategyError::InvalidParameters(
                "Fast MA period must be less than Slow MA period".to_string(),
            ));
        }
        let sma = |period: usize| {
            Sma::new(period).map_err(|e| {
                StrategyError::InvalidParameters(format!("Failed to initialize SMA({}): {:?}", period, e))
            })
        };

        Ok(Self {
            feed: BarFeed::new(),
            min_history: params.ma_slow_period.max(params.trend_filter_period),
            ma_fast: sma(params.ma_fast_period)?,
            ma_slow: sma(params.ma_slow_period)?,
            trend_filter: sma(params.trend_filter_period)?,
            prev_fast_ma: None,
            prev_slow_ma: None,
            last_signal: Signal::None,
        })
    }

    fn step(&mut self, bar: &Bar, history_len: usize) -> Result<Signal, StrategyError> {
        // The `ta` crate uses `f64`. We must convert from our high-precision `Decimal`.
        let close = to_f64(bar.close)?;

        let current_fast_ma = self.ma_fast.next(close);
        let current_slow_ma = self.ma_slow.next(close);
        let trend_filter_ma = self.trend_filter.next(close);

        let mut signal = Signal::None;

        // Ensure we have previous MA values and a full trend window before
        // trusting a crossover.
        if let (Some(prev_fast), Some(prev_slow)) = (self.prev_fast_ma, self.prev_slow_ma) {
            if history_len >= self.min_history {
                let is_bullish_cross = prev_fast <= prev_slow && current_fast_ma > current_slow_ma;
                let is_bearish_cross = prev_fast >= prev_slow && current_fast_ma < current_slow_ma;

                if is_bullish_cross && close > trend_filter_ma {
                    signal = Signal::Buy;
                } else if is_bearish_cross && close < trend_filter_ma {
                    signal = Signal::Sell;
                }
            }
        }

        // Update state for the next evaluation.
        self.prev_fast_ma = Some(current_fast_ma);
        self.prev_slow_ma = Some(current_slow_ma);

        Ok(signal)
    }
}

impl Strategy for MACrossover {
    fn name(&self) -> &str {
        "MACrossover"
    }

    /// A buy signal is generated when the fast MA crosses above the slow MA,
    /// AND the closing price is above the long-term trend filter MA.
    ///
    /// A sell signal is generated when the fast MA crosses below the slow MA,
    /// AND the closing price is below the long-term trend filter MA.
    fn evaluate(&mut self, bars: &[Bar]) -> Result<Signal, StrategyError> {
        let already_seen = self.feed.consumed();
        let fresh = self.feed.unseen(bars)?;
        for (offset, bar) in fresh.iter().enumerate() {
            self.last_signal = self.step(bar, already_seen + offset + 1)?;
        }

        if self.last_signal.is_actionable() {
            tracing::debug!(signal = ?self.last_signal, bars = bars.len(), "MACrossover signal");
        }
        Ok(self.last_signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::bars_from_closes;

    fn params() -> MACrossoverParams {
        MACrossoverParams { ma_fast_period: 2, ma_slow_period: 4, trend_filter_period: 6 }
    }

    #[test]
    fn rejects_inverted_periods() {
        let p = MACrossoverParams { ma_fast_period: 5, ma_slow_period: 5, trend_filter_period: 10 };
        assert!(MACrossover::new(p).is_err());
    }

    #[test]
    fn emits_buy_on_bullish_cross_above_trend() {
        // Falling then sharply rising closes force the fast MA through the slow MA.
        let closes = [10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 9.0, 14.0];
        let bars = bars_from_closes(&closes);
        let mut strategy = MACrossover::new(params()).unwrap();

        let mut signals = Vec::new();
        for i in 0..bars.len() {
            signals.push(strategy.evaluate(&bars[..=i]).unwrap());
        }
        assert!(signals.contains(&Signal::Buy));
        assert!(!signals.contains(&Signal::Sell));
    }

    #[test]
    fn catching_up_matches_bar_by_bar_evaluation() {
        let closes = [10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 9.0, 14.0];
        let bars = bars_from_closes(&closes);

        let mut stepwise = MACrossover::new(params()).unwrap();
        let mut last = Signal::None;
        for i in 0..bars.len() {
            last = stepwise.evaluate(&bars[..=i]).unwrap();
        }

        let mut batched = MACrossover::new(params()).unwrap();
        batched.evaluate(&bars[..3]).unwrap();
        assert_eq!(batched.evaluate(&bars).unwrap(), last);
    }
}

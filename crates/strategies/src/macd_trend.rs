use crate::error::StrategyError;
use crate::feed::BarFeed;
use crate::{Strategy, to_f64};
use configuration::MacdTrendParams;
use core_types::{Bar, Signal};
use ta::Next;
use ta::indicators::{ExponentialMovingAverage as Ema, MovingAverageConvergenceDivergence as Macd};

/// MACD crossover entries, taken only in the direction of a long EMA trend.
///
/// Long when price is above the trend EMA and MACD crosses up through its
/// signal line; short on the mirror image.
pub struct MacdTrend {
    feed: BarFeed,
    min_history: usize,
    macd: Macd,
    trend: Ema,
    prev: Option<(f64, f64)>,
    last_signal: Signal,
}

impl MacdTrend {
    pub fn new(params: MacdTrendParams) -> Result<Self, StrategyError> {
        if params.macd_fast >= params.macd_slow {
            return Err(StrategyError::InvalidParameters(
                "MACD fast period must be less than slow period".to_string(),
            ));
        }
        let macd = Macd::new(params.macd_fast, params.macd_slow, params.macd_signal)
            .map_err(|e| StrategyError::InvalidParameters(format!("Failed to initialize MACD: {:?}", e)))?;
        let trend = Ema::new(params.ema_trend)
            .map_err(|e| StrategyError::InvalidParameters(format!("Failed to initialize EMA: {:?}", e)))?;

        Ok(Self {
            feed: BarFeed::new(),
            // One extra bar so the previous MACD pair exists.
            min_history: params.ema_trend + 2,
            macd,
            trend,
            prev: None,
            last_signal: Signal::None,
        })
    }

    fn step(&mut self, bar: &Bar, history_len: usize) -> Result<Signal, StrategyError> {
        let close = to_f64(bar.close)?;
        let out = self.macd.next(close);
        let trend = self.trend.next(close);

        let signal = match self.prev {
            Some((macd_prev, sig_prev)) if history_len >= self.min_history => {
                if close > trend && macd_prev < sig_prev && out.macd > out.signal {
                    Signal::Buy
                } else if close < trend && macd_prev > sig_prev && out.macd < out.signal {
                    Signal::Sell
                } else {
                    Signal::None
                }
            }
            _ => Signal::None,
        };

        self.prev = Some((out.macd, out.signal));
        Ok(signal)
    }
}

impl Strategy for MacdTrend {
    fn name(&self) -> &str {
        "MacdTrend"
    }

    fn evaluate(&mut self, bars: &[Bar]) -> Result<Signal, StrategyError> {
        let already_seen = self.feed.consumed();
        let fresh = self.feed.unseen(bars)?;
        for (offset, bar) in fresh.iter().enumerate() {
            self.last_signal = self.step(bar, already_seen + offset + 1)?;
        }
        Ok(self.last_signal)
    }
}

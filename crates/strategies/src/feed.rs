use crate::error::StrategyError;
use core_types::Bar;

/// Tracks how much of the bar history a strategy has already consumed.
///
/// The simulator skips evaluation while a trade is open, so a strategy can
/// receive several new bars in one call. Feeding only the unseen tail keeps
/// incremental indicators in step with the history at O(1) per bar.
#[derive(Debug, Clone, Default)]
pub struct BarFeed {
    consumed: usize,
}

impl BarFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bars not yet seen and marks them consumed.
    pub fn unseen<'a>(&mut self, bars: &'a [Bar]) -> Result<&'a [Bar], StrategyError> {
        if bars.len() < self.consumed {
            return Err(StrategyError::HistoryRewound {
                seen: self.consumed,
                received: bars.len(),
            });
        }
        let fresh = &bars[self.consumed..];
        self.consumed = bars.len();
        Ok(fresh)
    }

    /// Total bars consumed so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

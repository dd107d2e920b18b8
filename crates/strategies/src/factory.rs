use crate::Strategy;
use crate::error::StrategyError;
use crate::ma_crossover::MACrossover;
use crate::macd_trend::MacdTrend;
use crate::rsi_reversion::RsiReversion;
use configuration::Strategies;
use core_types::StrategyId;

/// Creates a new strategy instance based on the provided ID and parameters.
///
/// Every call returns a fresh instance with empty indicator state, so each
/// simulation run (or optimizer unit) must build its own.
pub fn create_strategy(
    id: StrategyId,
    params: &Strategies,
) -> Result<Box<dyn Strategy>, StrategyError> {
    // The compiler will error if a new StrategyId is added but not handled here.
    match id {
        StrategyId::MACrossover => Ok(Box::new(MACrossover::new(params.ma_crossover.clone())?)),
        StrategyId::MacdTrend => Ok(Box::new(MacdTrend::new(params.macd_trend.clone())?)),
        StrategyId::RsiReversion => Ok(Box::new(RsiReversion::new(params.rsi_reversion.clone())?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_every_strategy_with_default_parameters() {
        let params = Strategies::default();
        for id in StrategyId::ALL {
            let strategy = create_strategy(id, &params).unwrap();
            assert_eq!(strategy.name(), id.as_str());
        }
    }

    #[test]
    fn invalid_parameters_surface_as_errors() {
        let mut params = Strategies::default();
        params.ma_crossover.ma_fast_period = 50;
        assert!(matches!(
            create_strategy(StrategyId::MACrossover, &params),
            Err(StrategyError::InvalidParameters(_))
        ));
    }
}

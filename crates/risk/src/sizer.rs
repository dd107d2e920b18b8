use crate::error::RiskError;
use configuration::{RiskManagement, RiskTier};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Fixed-fractional sizing: risk `equity * risk_fraction` over the distance
/// between entry and stop.
///
/// Returns whole units in `[0, max_units]`. Non-positive equity yields 0.
pub fn position_size(
    equity: Decimal,
    entry_price: Decimal,
    stop_price: Decimal,
    risk_fraction: Decimal,
    max_units: u64,
) -> Result<u64, RiskError> {
    let per_unit_risk = (entry_price - stop_price).abs();
    if per_unit_risk <= Decimal::ZERO {
        return Err(RiskError::DegenerateStop {
            entry: entry_price,
            stop: stop_price,
        });
    }
    if equity <= Decimal::ZERO || risk_fraction <= Decimal::ZERO {
        return Ok(0);
    }

    // Overflow in the Decimal math or the u64 conversion is far past the cap anyway.
    let units = equity
        .checked_mul(risk_fraction)
        .and_then(|risk_amount| risk_amount.checked_div(per_unit_risk))
        .and_then(|raw_units| raw_units.floor().to_u64())
        .unwrap_or(max_units);
    Ok(units.min(max_units))
}

/// Drawdown brackets mapped to the fraction of equity risked per trade.
#[derive(Debug, Clone)]
pub struct RiskTiers {
    tiers: Vec<RiskTier>,
    floor: Decimal,
}

impl RiskTiers {
    /// Tiers must be sorted by ascending `max_drawdown`.
    pub fn new(tiers: Vec<RiskTier>, floor: Decimal) -> Result<Self, RiskError> {
        if tiers.windows(2).any(|w| w[0].max_drawdown >= w[1].max_drawdown) {
            return Err(RiskError::InvalidParameters(
                "risk tiers must have strictly ascending max_drawdown".to_string(),
            ));
        }
        Ok(Self { tiers, floor })
    }

    pub fn from_config(config: &RiskManagement) -> Result<Self, RiskError> {
        Self::new(config.tiers.clone(), config.floor_risk_fraction)
    }

    /// The risk fraction for the first bracket whose ceiling lies above
    /// `drawdown_pct`, or the floor when none does.
    pub fn risk_fraction(&self, drawdown_pct: Decimal) -> Decimal {
        self.tiers
            .iter()
            .find(|tier| drawdown_pct < tier.max_drawdown)
            .map(|tier| tier.risk_fraction)
            .unwrap_or(self.floor)
    }
}

impl Default for RiskTiers {
    fn default() -> Self {
        let config = RiskManagement::default();
        Self {
            tiers: config.tiers,
            floor: config.floor_risk_fraction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn brackets_follow_drawdown() {
        let tiers = RiskTiers::default();
        assert_eq!(tiers.risk_fraction(dec!(0)), dec!(0.02));
        assert_eq!(tiers.risk_fraction(dec!(0.0499)), dec!(0.02));
        assert_eq!(tiers.risk_fraction(dec!(0.05)), dec!(0.006));
        assert_eq!(tiers.risk_fraction(dec!(0.07)), dec!(0.006));
        assert_eq!(tiers.risk_fraction(dec!(0.10)), dec!(0.0018));
        assert_eq!(tiers.risk_fraction(dec!(0.5)), dec!(0.0018));
    }

    #[test]
    fn unsorted_tiers_are_rejected() {
        let mut config = RiskManagement::default();
        config.tiers.reverse();
        assert!(RiskTiers::from_config(&config).is_err());
    }

    #[test]
    fn sizes_by_risk_budget() {
        // 10000 * 0.02 = 200 at risk, 0.5 per unit.
        let units = position_size(dec!(10000), dec!(100), dec!(99.5), dec!(0.02), 1000).unwrap();
        assert_eq!(units, 400);
    }

    #[test]
    fn fractional_units_are_floored() {
        let units = position_size(dec!(1000), dec!(10), dec!(7), dec!(0.01), 1000).unwrap();
        assert_eq!(units, 3);
    }

    #[test]
    fn cap_is_enforced() {
        let units = position_size(dec!(1000000), dec!(100), dec!(99.99), dec!(0.02), 1000).unwrap();
        assert_eq!(units, 1000);
    }

    #[test]
    fn cap_holds_when_the_unit_count_overflows() {
        let units = position_size(
            dec!(1000000000),
            dec!(1.0000000000000000000000000001),
            dec!(1),
            dec!(0.02),
            1000,
        )
        .unwrap();
        assert_eq!(units, 1000);
    }

    #[test]
    fn zero_stop_distance_is_degenerate() {
        assert!(matches!(
            position_size(dec!(10000), dec!(100), dec!(100), dec!(0.02), 1000),
            Err(RiskError::DegenerateStop { .. })
        ));
    }

    #[test]
    fn non_positive_equity_sizes_to_zero() {
        assert_eq!(position_size(dec!(0), dec!(100), dec!(99), dec!(0.02), 1000).unwrap(), 0);
        assert_eq!(position_size(dec!(-10), dec!(100), dec!(99), dec!(0.02), 1000).unwrap(), 0);
    }

    #[test]
    fn size_never_grows_with_drawdown() {
        let tiers = RiskTiers::default();
        let mut last = u64::MAX;
        for step in 0..=30 {
            let drawdown = Decimal::from(step) / dec!(100);
            let units = position_size(dec!(10000), dec!(50), dec!(49.9), tiers.risk_fraction(drawdown), u64::MAX)
                .unwrap();
            assert!(units <= last, "size grew at drawdown {}", drawdown);
            last = units;
        }
    }
}

use crate::error::CoreError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// `+1` for longs, `-1` for shorts. Multiplying a raw price move by this
    /// gives the move in the trade's favour.
    pub fn sign(&self) -> Decimal {
        match self {
            OrderSide::Buy => Decimal::ONE,
            OrderSide::Sell => Decimal::NEGATIVE_ONE,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// The output of a strategy for the bar it was evaluated at.
///
/// `None` means "no action this bar".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    None,
}

impl Signal {
    /// The direction a position would take on this signal, if any.
    pub fn side(&self) -> Option<OrderSide> {
        match self {
            Signal::Buy => Some(OrderSide::Buy),
            Signal::Sell => Some(OrderSide::Sell),
            Signal::None => None,
        }
    }

    pub fn is_actionable(&self) -> bool {
        self.side().is_some()
    }
}

/// Why a simulated trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    Stop,
    Target,
    Timeout,
    EndOfData,
}

/// Identifies each concrete strategy the factory knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StrategyId {
    MACrossover,
    MacdTrend,
    RsiReversion,
}

impl StrategyId {
    /// Every strategy, in the enumeration order used by the allocator.
    pub const ALL: [StrategyId; 3] = [
        StrategyId::MACrossover,
        StrategyId::MacdTrend,
        StrategyId::RsiReversion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::MACrossover => "MACrossover",
            StrategyId::MacdTrend => "MacdTrend",
            StrategyId::RsiReversion => "RsiReversion",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyId {
    type Err = CoreError;

    /// Case-insensitive, ignoring `_` and `-`, so `macd_trend`, `MacdTrend`
    /// and `macd-trend` all resolve.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        StrategyId::ALL
            .into_iter()
            .find(|id| id.as_str().to_lowercase() == normalized)
            .ok_or_else(|| CoreError::UnknownStrategy(s.to_string()))
    }
}

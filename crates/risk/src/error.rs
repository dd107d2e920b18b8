use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RiskError {
    #[error("Risk parameters from configuration are invalid: {0}")]
    InvalidParameters(String),

    #[error("Insufficient equity ({0}) to execute trade based on risk rules.")]
    InsufficientEquity(Decimal),

    #[error("Stop price {stop} gives no risk per unit against entry {entry}.")]
    DegenerateStop { entry: Decimal, stop: Decimal },

    #[error("Stop-loss price is on the wrong side of the entry: {0}")]
    InvalidStopLoss(String),

    #[error("The provided entry price ({0}) is zero or negative.")]
    InvalidEntryPrice(Decimal),

    #[error("Risk budget {0} buys less than one unit.")]
    ZeroUnits(Decimal),
}

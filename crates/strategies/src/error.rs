use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Strategy received invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("An error occurred during indicator calculation: {0}")]
    IndicatorError(String),

    #[error("Bar history shrank from {seen} to {received} bars; strategies are single-run")]
    HistoryRewound { seen: usize, received: usize },
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Strategy execution error: {0}")]
    Strategy(#[from] strategies::StrategyError),

    #[error("Analytics calculation error: {0}")]
    Analytics(#[from] analytics::AnalyticsError),

    #[error("Trade bookkeeping error: {0}")]
    Trade(#[from] core_types::CoreError),

    #[error("Simulation parameters are invalid: {0}")]
    InvalidParameters(String),

    #[error("No bars supplied but a warmup of {0} bars was requested.")]
    EmptyData(usize),
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AllocatorError {
    #[error("The allocator has no arms to choose from.")]
    NoArms,

    #[error("Unknown arm: {0}")]
    UnknownArm(String),

    #[error("Arm '{0}' is registered more than once.")]
    DuplicateArm(String),

    #[error("The allocator lock was poisoned by a panicking holder.")]
    Poisoned,

    #[error("Simulation for arm '{arm}' failed: {source}")]
    Simulation {
        arm: String,
        #[source]
        source: backtester::BacktestError,
    },

    #[error("Strategy construction failed: {0}")]
    Strategy(#[from] strategies::StrategyError),

    #[error("Snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

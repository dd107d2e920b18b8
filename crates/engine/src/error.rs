use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Risk management error: {0}")]
    Risk(#[from] risk::RiskError),

    #[error("Allocator error: {0}")]
    Allocator(#[from] allocator::AllocatorError),

    #[error("Broker rejected order for '{instrument}': {reason}")]
    Broker { instrument: String, reason: String },

    #[error("Broker state lock was poisoned.")]
    Poisoned,
}

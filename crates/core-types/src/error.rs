use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unknown strategy identifier: {0}")]
    UnknownStrategy(String),

    #[error("Trade is already closed (exit index {0})")]
    TradeAlreadyClosed(usize),
}

use crate::error::EngineError;
use core_types::OrderIntent;
use std::sync::Mutex;

/// The boundary to whatever places real orders.
///
/// Price rounding, order placement and fill confirmation all happen on the
/// far side of this trait.
pub trait Broker: Send + Sync {
    fn submit(&self, intent: &OrderIntent) -> Result<(), EngineError>;
}

/// Accepts every intent and keeps it in memory. Used for dry runs.
#[derive(Debug, Default)]
pub struct PaperBroker {
    submitted: Mutex<Vec<OrderIntent>>,
}

impl PaperBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> Result<Vec<OrderIntent>, EngineError> {
        Ok(self.submitted.lock().map_err(|_| EngineError::Poisoned)?.clone())
    }
}

impl Broker for PaperBroker {
    fn submit(&self, intent: &OrderIntent) -> Result<(), EngineError> {
        tracing::info!(
            instrument = %intent.instrument,
            direction = %intent.direction,
            units = intent.units,
            entry = %intent.entry_price_hint,
            stop = %intent.stop_price,
            target = %intent.target_price,
            "Paper order accepted"
        );
        self.submitted
            .lock()
            .map_err(|_| EngineError::Poisoned)?
            .push(intent.clone());
        Ok(())
    }
}

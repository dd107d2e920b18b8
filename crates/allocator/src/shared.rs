use crate::error::AllocatorError;
use crate::ucb::{AllocatorSnapshot, StrategyArm, Ucb1Allocator};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex, MutexGuard};

/// A `Ucb1Allocator` shared between threads.
///
/// All arm statistics sit behind a single lock, so a select followed by its
/// update can never interleave with another caller's round.
#[derive(Debug, Clone)]
pub struct SharedAllocator {
    inner: Arc<Mutex<Ucb1Allocator>>,
}

impl SharedAllocator {
    pub fn new(allocator: Ucb1Allocator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(allocator)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ucb1Allocator>, AllocatorError> {
        self.inner.lock().map_err(|_| AllocatorError::Poisoned)
    }

    pub fn select(&self) -> Result<String, AllocatorError> {
        Ok(self.lock()?.select_arm()?.to_string())
    }

    pub fn update(&self, name: &str, reward: Decimal) -> Result<(), AllocatorError> {
        self.lock()?.update(name, reward)
    }

    /// One full bandit round under one lock: select an arm, let `pull`
    /// produce its reward, record it.
    ///
    /// If `pull` fails nothing is recorded.
    pub fn select_and_update<F, E>(&self, pull: F) -> Result<(String, Decimal), E>
    where
        F: FnOnce(&str) -> Result<Decimal, E>,
        E: From<AllocatorError>,
    {
        let mut allocator = self.lock()?;
        let name = allocator.select_arm()?.to_string();
        let reward = pull(&name)?;
        allocator.update(&name, reward)?;
        Ok((name, reward))
    }

    /// Arms that have never been pulled.
    pub fn unpulled(&self) -> Result<usize, AllocatorError> {
        Ok(self.lock()?.arms().iter().filter(|arm| arm.pull_count == 0).count())
    }

    pub fn snapshot(&self) -> Result<AllocatorSnapshot, AllocatorError> {
        Ok(self.lock()?.snapshot())
    }

    pub fn winners(&self) -> Result<Vec<StrategyArm>, AllocatorError> {
        Ok(self.lock()?.winners().into_iter().cloned().collect())
    }
}

//! # Tradewind Allocator
//!
//! A UCB1 multi-armed bandit that spreads capital, or optimisation effort,
//! across competing strategies by their realised rewards.
//!
//! - `Ucb1Allocator`: the arm statistics and the selection rule.
//! - `SharedAllocator`: the same, behind one lock, for concurrent callers.
//! - `MetaOptimizer`: calibration plus `rounds` rounds of select, simulate, update.

pub mod error;
pub mod meta;
pub mod shared;
pub mod ucb;

pub use error::AllocatorError;
pub use meta::{MetaOptimizer, MetaReport, RollingWindows, Round, RoundData, reward_for};
pub use shared::SharedAllocator;
pub use ucb::{AllocatorSnapshot, StrategyArm, Ucb1Allocator};

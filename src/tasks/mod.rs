//! Background Tasks Module
//!
//! Contains the background task every cache runs for its whole lifetime.
//!
//! # Tasks
//! - Expiry Sweeper: removes expired cache entries at the configured interval
//! - Lifecycle: owns the sweeper's cancellation signal and stops it idempotently

mod lifecycle;
mod sweeper;

pub use lifecycle::Lifecycle;
pub use sweeper::{active_sweepers, spawn_sweeper, sweep_once};

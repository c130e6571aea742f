//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
///
/// A missing or expired key is not an error; `get` reports it as `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The cache was used after `close` completed
    #[error("cache is closed")]
    Closed,

    /// Construction parameters were rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The cache was constructed outside of a Tokio runtime
    #[error("no Tokio runtime available to run the sweeper")]
    NoRuntime,

    /// The sweeper did not acknowledge cancellation in time
    #[error("sweeper did not stop within {0:?}")]
    CloseTimeout(Duration),

    /// The sweeper task terminated abnormally
    #[error("Sweeper failed: {0}")]
    SweeperFailed(String),

    /// A thread panicked while holding the store lock
    #[error("cache lock poisoned")]
    LockPoisoned,
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

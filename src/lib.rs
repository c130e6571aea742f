//! TTL Cache - A process-local key-value cache with fixed time-to-live
//!
//! Entries expire one TTL after they are written. A background sweeper
//! reclaims expired entries, and `close` shuts it down idempotently.

pub mod cache;
pub mod config;
pub mod error;
pub mod report;
pub mod tasks;

pub use cache::{resident_bytes, CacheStats, TtlCache};
pub use config::{CacheConfig, Config};
pub use error::{CacheError, Result};
pub use tasks::active_sweepers;

//! Cache Module
//!
//! Provides the in-memory TTL cache: the locked entry store and the public
//! handle that ties it to its sweeper.

mod entry;
mod stats;
mod store;
mod ttl_cache;


// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::{lock_store, resident_bytes, EntryStore, LifecycleState, SharedStore};
pub use ttl_cache::TtlCache;

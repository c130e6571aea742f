//! TTL Cache Handle
//!
//! The public cache type: a locked entry store plus the lifecycle controller
//! of its background sweeper.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::cache::{lock_store, CacheStats, EntryStore, SharedStore};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::{sweep_once, Lifecycle};

// == TTL Cache ==
/// A thread-safe key-value cache where every entry lives for one fixed TTL.
///
/// Construction spawns a sweeper on the current Tokio runtime that purges
/// expired entries every `sweep_interval` (the TTL unless configured). `get`
/// never returns an expired value, whether or not the sweeper has run yet.
///
/// `set` and `get` are synchronous and never await. `close` stops the sweeper
/// and releases the entries; afterwards both return `CacheError::Closed`.
/// Share a cache between tasks or threads with `Arc<TtlCache>`.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use ttl_cache::TtlCache;
///
/// #[tokio::main]
/// async fn main() -> ttl_cache::Result<()> {
///     let cache = TtlCache::new(Duration::from_secs(300))?;
///
///     cache.set("my-key", "my-value")?;
///     assert_eq!(cache.get("my-key")?.as_deref(), Some(&b"my-value"[..]));
///
///     cache.close().await?;
///     cache.close().await?; // no-op
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct TtlCache {
    store: SharedStore,
    lifecycle: Lifecycle,
    config: CacheConfig,
}

impl TtlCache {
    // == Constructors ==
    /// Creates a cache with the given TTL, sweeping once per TTL.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(ttl: Duration) -> Result<Self> {
        Self::with_config(CacheConfig::new(ttl))
    }

    /// Creates a cache from a full configuration.
    ///
    /// # Errors
    /// - `CacheError::InvalidConfig` for a zero TTL or sweep interval, or one above `MAX_TTL`
    /// - `CacheError::NoRuntime` when called outside a Tokio runtime
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(CacheError::NoRuntime);
        }

        let store: SharedStore = Arc::new(Mutex::new(EntryStore::new(config.ttl)));
        let sweep_interval = config.effective_sweep_interval();
        let lifecycle = Lifecycle::start(Arc::clone(&store), sweep_interval);

        debug!(
            "Cache created: ttl={:?}, sweep_interval={:?}",
            config.ttl, sweep_interval
        );

        Ok(Self {
            store,
            lifecycle,
            config,
        })
    }

    // == Set ==
    /// Inserts or replaces `key`, expiring one TTL from now.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Bytes>) -> Result<()> {
        let (key, value) = (key.into(), value.into());
        lock_store(&self.store)?.set_at(key, value, Instant::now())
    }

    // == Get ==
    /// Returns the value for `key` if it is present and not expired.
    ///
    /// A missing or expired key is `Ok(None)`.
    pub fn get(&self, key: &str) -> Result<Option<Bytes>> {
        lock_store(&self.store)?.get_at(key, Instant::now())
    }

    // == Close ==
    /// Stops the sweeper, then marks the cache closed and releases its entries.
    ///
    /// Safe to call from any task and any number of times; calls after the
    /// first return `Ok(())` without doing anything. If a close timeout is
    /// configured and the sweeper does not stop in time, the cache is still
    /// closed and `CacheError::CloseTimeout` is returned.
    pub async fn close(&self) -> Result<()> {
        let stopped = self.lifecycle.stop(self.config.close_timeout).await;

        let released = lock_store(&self.store)?.close();
        if released {
            info!("Cache closed");
        } else {
            debug!("Cache already closed");
        }

        stopped.map(|_| ())
    }

    // == Purge Expired ==
    /// Runs one sweep pass immediately instead of waiting for the next tick.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> Result<usize> {
        sweep_once(&self.store)
    }

    /// Returns the number of resident entries, including expired entries the
    /// sweeper has not reclaimed yet.
    pub fn len(&self) -> Result<usize> {
        Ok(lock_store(&self.store)?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(lock_store(&self.store)?.is_empty())
    }

    /// Returns a snapshot of the cache's activity counters.
    ///
    /// Still available after `close`.
    pub fn stats(&self) -> Result<CacheStats> {
        Ok(lock_store(&self.store)?.stats())
    }

    pub fn is_closed(&self) -> Result<bool> {
        Ok(lock_store(&self.store)?.is_closed())
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    pub fn sweep_interval(&self) -> Duration {
        self.config.effective_sweep_interval()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

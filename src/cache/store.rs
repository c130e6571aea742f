//! Entry Store Module
//!
//! HashMap storage with per-entry deadlines and the lifecycle flag. Every
//! operation takes the current instant explicitly so callers (and tests)
//! control the clock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

use crate::cache::{CacheEntry, CacheStats};
use crate::error::{CacheError, Result};

/// Key and value bytes held by every store in the process
static RESIDENT_BYTES: AtomicUsize = AtomicUsize::new(0);

/// Returns the key and value bytes resident across every store in the process,
/// expired entries not yet reclaimed included.
pub fn resident_bytes() -> usize {
    RESIDENT_BYTES.load(Ordering::SeqCst)
}

fn entry_size(key: &str, entry: &CacheEntry) -> usize {
    key.len() + entry.value.len()
}

/// Store handle shared between the cache and its sweeper.
///
/// The single mutex covers both the entries and the lifecycle flag.
pub type SharedStore = Arc<Mutex<EntryStore>>;

/// Locks the shared store, mapping poisoning to `CacheError::LockPoisoned`.
pub fn lock_store(store: &SharedStore) -> Result<MutexGuard<'_, EntryStore>> {
    store.lock().map_err(|_| CacheError::LockPoisoned)
}

// == Lifecycle State ==
/// Whether the store still accepts operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Running,
    Closed,
}

// == Entry Store ==
/// Main cache storage with TTL support.
#[derive(Debug)]
pub struct EntryStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Lifetime applied to every write
    ttl: Duration,
    /// Running until the owning cache is closed
    state: LifecycleState,
    /// Activity counters
    stats: CacheStats,
    /// Key and value bytes currently held
    size_bytes: usize,
}

impl EntryStore {
    // == Constructor ==
    /// Creates an empty, running store with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            state: LifecycleState::Running,
            stats: CacheStats::new(),
            size_bytes: 0,
        }
    }

    // == Set ==
    /// Stores a key-value pair expiring `ttl` after `now`.
    ///
    /// An existing entry is replaced, value and deadline together.
    pub fn set_at(&mut self, key: String, value: Bytes, now: Instant) -> Result<()> {
        self.ensure_running()?;

        let entry = CacheEntry::new(value, self.ttl, now);
        self.grow(entry_size(&key, &entry));
        if let Some(old) = self.entries.insert(key.clone(), entry) {
            self.shrink(entry_size(&key, &old));
        }
        self.stats.record_set();
        self.stats.set_total_entries(self.entries.len());

        Ok(())
    }

    // == Get ==
    /// Retrieves a live value by key.
    ///
    /// Freshness is checked against `now` rather than trusting the sweeper;
    /// a stale entry is removed and reported as a miss.
    pub fn get_at(&mut self, key: &str, now: Instant) -> Result<Option<Bytes>> {
        self.ensure_running()?;

        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                return Ok(Some(value));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            if let Some(old) = self.entries.remove(key) {
                self.shrink(entry_size(key, &old));
            }
            self.stats.record_expiration();
            self.stats.set_total_entries(self.entries.len());
        }
        self.stats.record_miss();
        Ok(None)
    }

    // == Sweep Expired ==
    /// Removes every entry whose deadline is at or before `now`.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired_at(&mut self, now: Instant) -> Result<usize> {
        self.ensure_running()?;

        let mut removed = 0;
        let mut freed = 0;
        self.entries.retain(|key, entry| {
            let expired = entry.is_expired_at(now);
            if expired {
                removed += 1;
                freed += entry_size(key, entry);
            }
            !expired
        });
        self.shrink(freed);

        self.stats.record_sweep(removed);
        self.stats.set_total_entries(self.entries.len());
        Ok(removed)
    }

    // == Close ==
    /// Marks the store closed and releases its entries.
    ///
    /// Returns `false` if the store was already closed.
    pub fn close(&mut self) -> bool {
        if self.state == LifecycleState::Closed {
            return false;
        }

        self.state = LifecycleState::Closed;
        self.entries = HashMap::new();
        self.shrink(self.size_bytes);
        self.stats.set_total_entries(0);
        true
    }

    /// Returns the key and value bytes this store holds.
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    fn grow(&mut self, bytes: usize) {
        self.size_bytes += bytes;
        RESIDENT_BYTES.fetch_add(bytes, Ordering::SeqCst);
    }

    fn shrink(&mut self, bytes: usize) {
        self.size_bytes -= bytes;
        RESIDENT_BYTES.fetch_sub(bytes, Ordering::SeqCst);
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == LifecycleState::Closed
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a snapshot of the activity counters.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Returns the number of resident entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ensure_running(&self) -> Result<()> {
        match self.state {
            LifecycleState::Running => Ok(()),
            LifecycleState::Closed => Err(CacheError::Closed),
        }
    }
}

impl Drop for EntryStore {
    fn drop(&mut self) {
        RESIDENT_BYTES.fetch_sub(self.size_bytes, Ordering::SeqCst);
    }
}

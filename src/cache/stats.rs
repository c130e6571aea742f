//! Cache Statistics Module
//!
//! Tracks lookups, writes, and expiry activity for a single cache.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache activity metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of lookups that returned a live value
    pub hits: u64,
    /// Number of lookups for absent or expired keys
    pub misses: u64,
    /// Number of set operations
    pub sets: u64,
    /// Number of completed sweep passes
    pub sweeps: u64,
    /// Entries removed after expiring, by a sweep or by a stale lookup
    pub expirations: u64,
    /// Current number of resident entries, including expired ones not yet swept
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    /// Records one sweep pass that removed `removed` entries.
    pub fn record_sweep(&mut self, removed: usize) {
        self.sweeps += 1;
        self.expirations += removed as u64;
    }

    /// Records a stale entry dropped during a lookup.
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

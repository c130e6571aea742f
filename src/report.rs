//! Churn Report
//!
//! Progress snapshot the churn binary logs as JSON.

use serde::Serialize;

/// Progress of the create/set/get/close churn loop.
#[derive(Debug, Clone, Serialize)]
pub struct ChurnReport {
    /// RFC 3339 time the report was taken
    pub timestamp: String,
    /// Caches created and closed so far
    pub iterations: u64,
    /// Sweeper tasks alive at report time
    pub active_sweepers: usize,
    /// Key and value bytes held by caches at report time
    pub resident_bytes: usize,
}

impl ChurnReport {
    /// Creates a report stamped with the current time.
    pub fn new(iterations: u64, active_sweepers: usize, resident_bytes: usize) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            iterations,
            active_sweepers,
            resident_bytes,
        }
    }

    /// Renders the report as a single JSON line.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

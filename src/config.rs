//! Configuration Module
//!
//! Cache construction parameters, plus the settings the churn binary loads
//! from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Default TTL applied by `CacheConfig::default()` (five minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Longest accepted TTL or sweep interval (100 years)
///
/// Deadlines are computed as `now + ttl` on every write, so the bound keeps
/// that sum representable for the whole life of the process.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

// == Cache Config ==
/// Parameters fixed for the lifetime of a `TtlCache`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Time-to-live applied to every entry
    pub ttl: Duration,
    /// Period of the background sweep; `None` sweeps once per TTL
    pub sweep_interval: Option<Duration>,
    /// Upper bound on how long `close` waits for the sweeper
    pub close_timeout: Option<Duration>,
}

impl CacheConfig {
    /// Creates a config with the given TTL and no other overrides.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sweep_interval: None,
            close_timeout: None,
        }
    }

    /// Sets the sweep period.
    ///
    /// A period shorter than the TTL tightens the staleness window from
    /// `2 * ttl` down to `ttl + sweep_interval`.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    /// Bounds how long `close` waits for the sweeper to acknowledge.
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = Some(timeout);
        self
    }

    /// Returns the effective sweep period.
    pub fn effective_sweep_interval(&self) -> Duration {
        self.sweep_interval.unwrap_or(self.ttl)
    }

    // == Validate ==
    /// Rejects parameters the store or the sweeper timer cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.ttl.is_zero() {
            return Err(CacheError::InvalidConfig(
                "ttl must be greater than zero".to_string(),
            ));
        }

        let interval = self.effective_sweep_interval();
        if interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "sweep interval must be greater than zero".to_string(),
            ));
        }

        if self.ttl > MAX_TTL {
            return Err(CacheError::InvalidConfig(format!(
                "ttl of {:?} exceeds the maximum of {:?}",
                self.ttl, MAX_TTL
            )));
        }
        if interval > MAX_TTL {
            return Err(CacheError::InvalidConfig(format!(
                "sweep interval of {:?} exceeds the maximum of {:?}",
                interval, MAX_TTL
            )));
        }

        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

// == Churn Settings ==
/// Settings for the churn binary.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// TTL in seconds for every cache the churn loop creates
    pub ttl_secs: u64,
    /// Sweep interval in seconds, defaults to the TTL when unset
    pub sweep_interval_secs: Option<u64>,
    /// Close timeout in milliseconds, unbounded when unset
    pub close_timeout_ms: Option<u64>,
    /// Seconds between progress reports
    pub report_interval_secs: u64,
    /// Number of create/set/get/close cycles, 0 = run until interrupted
    pub iterations: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_SECS` - Entry TTL in seconds (default: 300)
    /// - `SWEEP_INTERVAL_SECS` - Sweep period in seconds (default: unset, uses TTL)
    /// - `CLOSE_TIMEOUT_MS` - Close timeout in milliseconds (default: unset)
    /// - `REPORT_INTERVAL_SECS` - Progress report period (default: 5)
    /// - `CHURN_ITERATIONS` - Cycles to run, 0 for unbounded (default: 0)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl_secs: parse_var("CACHE_TTL_SECS").unwrap_or(defaults.ttl_secs),
            sweep_interval_secs: parse_var("SWEEP_INTERVAL_SECS"),
            close_timeout_ms: parse_var("CLOSE_TIMEOUT_MS"),
            report_interval_secs: parse_var("REPORT_INTERVAL_SECS")
                .unwrap_or(defaults.report_interval_secs),
            iterations: parse_var("CHURN_ITERATIONS").unwrap_or(defaults.iterations),
        }
    }

    /// Builds the cache parameters described by these settings.
    pub fn cache_config(&self) -> CacheConfig {
        let mut config = CacheConfig::new(Duration::from_secs(self.ttl_secs));
        if let Some(secs) = self.sweep_interval_secs {
            config = config.with_sweep_interval(Duration::from_secs(secs));
        }
        if let Some(ms) = self.close_timeout_ms {
            config = config.with_close_timeout(Duration::from_millis(ms));
        }
        config
    }

    /// Returns the report period, never shorter than one second.
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL.as_secs(),
            sweep_interval_secs: None,
            close_timeout_ms: None,
            report_interval_secs: 5,
            iterations: 0,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

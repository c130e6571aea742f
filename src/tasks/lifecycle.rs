//! Sweeper Lifecycle
//!
//! Owns the cancellation signal and join handle of a cache's sweeper and
//! performs the idempotent stop sequence.

use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::SharedStore;
use crate::error::{CacheError, Result};
use crate::tasks::spawn_sweeper;

/// Start/stop controller for one sweeper task.
///
/// The cancellation signal is a `watch` channel holding `true` once raised.
/// Raising it is level-triggered and may be repeated any number of times.
#[derive(Debug)]
pub struct Lifecycle {
    shutdown_tx: watch::Sender<bool>,
    /// Cleared once the sweeper has been joined or aborted
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl Lifecycle {
    /// Spawns the sweeper for `store` and returns its controller.
    pub fn start(store: SharedStore, sweep_interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_sweeper(store, sweep_interval, shutdown_rx);

        Self {
            shutdown_tx,
            sweeper: Mutex::new(Some(handle)),
        }
    }

    /// Raises the cancellation signal without waiting.
    pub fn signal(&self) {
        self.shutdown_tx.send_replace(true);
    }

    // == Stop ==
    /// Raises the cancellation signal and waits for the sweeper to exit.
    ///
    /// Returns `Ok(true)` for the call that observed termination and `Ok(false)`
    /// for every later call. Concurrent callers queue on the handle lock, so
    /// each of them returns only after the sweeper is gone. The handle stays in
    /// place while it is awaited, so a caller that abandons its `stop` future
    /// leaves the wait to the next caller.
    ///
    /// With a `timeout`, a sweeper that has not exited in time is aborted and
    /// `CacheError::CloseTimeout` is returned.
    pub async fn stop(&self, timeout: Option<Duration>) -> Result<bool> {
        self.signal();

        let mut slot = self.sweeper.lock().await;
        let Some(handle) = slot.as_mut() else {
            debug!("Sweeper already stopped");
            return Ok(false);
        };

        let joined = match timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut *handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!("Sweeper did not stop within {:?}, aborting it", limit);
                    handle.abort();
                    *slot = None;
                    return Err(CacheError::CloseTimeout(limit));
                }
            },
            None => handle.await,
        };
        *slot = None;

        match joined {
            Ok(()) => Ok(true),
            Err(e) if e.is_cancelled() => Ok(true),
            Err(e) => Err(CacheError::SweeperFailed(e.to_string())),
        }
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        // Let the sweeper exit even if nobody called stop
        self.signal();
    }
}

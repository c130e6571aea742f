//! Expiry Sweeper Task
//!
//! Background task that periodically removes expired cache entries until it
//! is told to stop.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::cache::{lock_store, SharedStore};
use crate::error::{CacheError, Result};

/// Sweeper tasks currently alive in this process
static ACTIVE_SWEEPERS: AtomicUsize = AtomicUsize::new(0);

/// Returns how many sweeper tasks are alive across every cache in the process.
pub fn active_sweepers() -> usize {
    ACTIVE_SWEEPERS.load(Ordering::SeqCst)
}

/// Counts a sweeper as alive for as long as its future exists, including
/// when the task is aborted rather than returning.
struct LiveSweeper;

impl LiveSweeper {
    fn register() -> Self {
        ACTIVE_SWEEPERS.fetch_add(1, Ordering::SeqCst);
        LiveSweeper
    }
}

impl Drop for LiveSweeper {
    fn drop(&mut self) {
        ACTIVE_SWEEPERS.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs a single sweep pass at the current instant.
///
/// Returns `Err(CacheError::Closed)` once the store has been closed.
pub fn sweep_once(store: &SharedStore) -> Result<usize> {
    let mut guard = lock_store(store)?;
    guard.sweep_expired_at(Instant::now())
}

/// Spawns the background task that sweeps `store` every `interval`.
///
/// The first pass runs one full interval after spawning. The task exits when
/// `shutdown_rx` observes `true`, when its sender is dropped, or when the store
/// turns out to be closed. The returned handle resolves once it has exited.
///
/// # Panics
/// Panics if `interval` is zero or if called outside a Tokio runtime.
///
/// # Example
/// ```ignore
/// let (shutdown_tx, shutdown_rx) = watch::channel(false);
/// let handle = spawn_sweeper(store.clone(), Duration::from_secs(5), shutdown_rx);
/// // Later, during shutdown:
/// shutdown_tx.send_replace(true);
/// handle.await?;
/// ```
pub fn spawn_sweeper(
    store: SharedStore,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let live = LiveSweeper::register();

    tokio::spawn(async move {
        let _live = live;
        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!("Sweeper started with interval of {:?}", interval);

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown_rx.changed() => {
                    // A dropped sender means the owning cache is gone
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    match sweep_once(&store) {
                        Ok(removed) if removed > 0 => {
                            info!("TTL sweep: removed {} expired entries", removed);
                        }
                        Ok(_) => {
                            debug!("TTL sweep: no expired entries found");
                        }
                        Err(CacheError::Closed) => break,
                        Err(e) => {
                            error!("TTL sweep failed, stopping sweeper: {}", e);
                            break;
                        }
                    }
                }
            }
        }

        debug!("Sweeper stopped");
    })
}

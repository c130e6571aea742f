//! TTL Churn - leak check for the TTL cache
//!
//! Repeatedly creates a cache, writes and reads one key, and closes it, while
//! a reporter logs how many caches went through, how many sweeper tasks are
//! still alive, and how many key/value bytes caches still hold. Steady counts
//! show closed caches leave nothing behind.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context};
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttl_cache::report::ChurnReport;
use ttl_cache::{active_sweepers, resident_bytes, CacheConfig, Config, TtlCache};

/// Main entry point for the churn loop.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Start the progress reporter
/// 4. Run create/set/get/close cycles until the iteration limit or a shutdown signal
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_cache=info,ttl_churn=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let cache_config = config.cache_config();
    cache_config.validate().context("invalid cache settings")?;
    info!(
        "Configuration loaded: ttl={}s, sweep_interval={:?}, iterations={}",
        config.ttl_secs,
        cache_config.effective_sweep_interval(),
        config.iterations
    );

    let iterations = Arc::new(AtomicU64::new(0));
    let reporter = spawn_reporter(Arc::clone(&iterations), config.report_interval());

    let result = tokio::select! {
        result = churn(&cache_config, config.iterations, &iterations) => result,
        _ = shutdown_signal() => Ok(()),
    };

    reporter.abort();
    log_report(iterations.load(Ordering::Relaxed));
    info!("Churn complete");
    result
}

/// Runs `limit` cycles, or forever when `limit` is 0.
async fn churn(config: &CacheConfig, limit: u64, iterations: &AtomicU64) -> anyhow::Result<()> {
    loop {
        work(config).await?;
        let done = iterations.fetch_add(1, Ordering::Relaxed) + 1;
        if limit != 0 && done >= limit {
            return Ok(());
        }
        // Give the sweepers and the reporter a chance to run
        tokio::task::yield_now().await;
    }
}

/// Creates a cache, sets a key, checks it reads back, and closes the cache.
async fn work(config: &CacheConfig) -> anyhow::Result<()> {
    let cache = TtlCache::with_config(config.clone())?;
    cache.set("my-key", "my-value")?;

    if cache.get("my-key")?.is_none() {
        bail!("no value present");
    }

    cache.close().await?;
    Ok(())
}

fn spawn_reporter(iterations: Arc<AtomicU64>, period: std::time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            log_report(iterations.load(Ordering::Relaxed));
        }
    })
}

fn log_report(iterations: u64) {
    match ChurnReport::new(iterations, active_sweepers(), resident_bytes()).to_json() {
        Ok(json) => info!("{}", json),
        Err(e) => warn!("Failed to encode churn report: {}", e),
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}

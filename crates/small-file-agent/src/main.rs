//! Small-file cache agent
//!
//! Long-running process that owns a cache instance and drives its
//! periodic maintenance: every interval it persists the metadata
//! snapshot and logs cache statistics. Ctrl-C triggers a final persist
//! before exit.

use small_file_cache::{CacheConfig, CacheManager};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

const DEFAULT_REPORT_INTERVAL_SECS: u64 = 60;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let env_filter =
        EnvFilter::from_default_env().add_directive("small_file_agent=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting small-file cache agent...");

    let config = CacheConfig::from_env()?;
    let interval_secs = std::env::var("REPORT_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_REPORT_INTERVAL_SECS);

    let cache = CacheManager::new(config).await?;

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    // The first tick fires immediately; report once at startup, then
    // on the cadence.
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let stats = cache.stats().await;
                info!(
                    "Cache stats: {} files, {} bytes, {:.1}% utilized",
                    stats.total_cached_files,
                    stats.current_cache_size_bytes,
                    stats.cache_utilization_percent
                );

                if let Err(err) = cache.persist().await {
                    warn!(error = %err, "Failed to persist metadata snapshot");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down, persisting metadata...");
                cache.persist().await?;
                break;
            }
        }
    }

    Ok(())
}

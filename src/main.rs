//! Panel Cache - cache subsystem host process
//!
//! Brings the cache layer up the way the dashboard server does at startup,
//! keeps it running, and shuts it down cleanly.

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use panel_cache::{init_caches, Config};

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Select the driver and build all caches (fails fast on bad config)
/// 4. Wait for SIGINT/SIGTERM
/// 5. Stop the expiry sweep
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "panel_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        cache_drive = %config.cache_drive,
        queue_drive = %config.queue_drive,
        cleanup_interval = config.cleanup_interval,
        "Configuration loaded"
    );

    let runtime = init_caches(&config)
        .await
        .context("cache initialization failed")?;

    shutdown_signal().await?;

    runtime.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM.
async fn shutdown_signal() -> anyhow::Result<()> {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .context("failed to install Ctrl+C handler")
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<anyhow::Result<()>>();

    tokio::select! {
        res = ctrl_c => {
            res?;
            info!("Received Ctrl+C, initiating shutdown...");
        }
        res = terminate => {
            res?;
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
    Ok(())
}

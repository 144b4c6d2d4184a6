//! Expiry Sweep Task
//!
//! Background task that periodically removes expired entries from the
//! in-memory driver, so abandoned keys do not accumulate.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::driver::MemoryDriver;

// == Sweep Handle ==
/// Owner of a running sweep task. Dropping the handle also stops the
/// task, but without waiting for it.
#[derive(Debug)]
pub struct SweepHandle {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SweepHandle {
    /// Signals the task to stop and waits for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                tracing::error!(error = %e, "Expiry sweep task panicked");
            }
        }
    }
}

/// Spawns a task that sweeps `driver` every `every`.
///
/// The first sweep runs one full interval after spawning. The task stops
/// as soon as `SweepHandle::shutdown` is called, even mid-wait.
pub fn spawn_sweep_task(driver: MemoryDriver, every: Duration) -> SweepHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        info!(interval_ms = every.as_millis() as u64, "Expiry sweep task started");

        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = driver.sweep();
                    if removed > 0 {
                        info!(removed, remaining = driver.len(), "Expiry sweep removed entries");
                    } else {
                        debug!("Expiry sweep found nothing to remove");
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Expiry sweep task stopping");
                        break;
                    }
                }
            }
        }
    });

    SweepHandle {
        shutdown_tx,
        handle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Ttl;

    #[tokio::test]
    async fn test_sweep_task_removes_expired_entries() {
        let driver = MemoryDriver::new();
        driver.set("expire_soon", b"v".to_vec(), Ttl::Expires(Duration::from_millis(50)));

        let sweep = spawn_sweep_task(driver.clone(), Duration::from_millis(100));

        // Expiry at 50ms, sweeps at 100ms and 200ms.
        tokio::time::sleep(Duration::from_millis(250)).await;

        assert_eq!(driver.len(), 0, "Expired entry should be physically removed");
        sweep.shutdown().await;
    }

    #[tokio::test]
    async fn test_sweep_task_preserves_valid_entries() {
        let driver = MemoryDriver::new();
        driver.set("long_lived", b"v".to_vec(), Ttl::from_secs(3600).unwrap());
        driver.set("forever", b"v".to_vec(), Ttl::Never);

        let sweep = spawn_sweep_task(driver.clone(), Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(driver.len(), 2);
        assert_eq!(driver.get("long_lived"), Some(b"v".to_vec()));
        sweep.shutdown().await;
    }

    #[tokio::test]
    async fn test_sweep_task_stops_immediately() {
        let sweep = spawn_sweep_task(MemoryDriver::new(), Duration::from_secs(3600));

        tokio::time::timeout(Duration::from_secs(1), sweep.shutdown())
            .await
            .expect("shutdown should not wait for the next tick");
    }

    #[tokio::test]
    async fn test_sweep_task_stops_when_handle_dropped() {
        let SweepHandle {
            shutdown_tx,
            handle,
        } = spawn_sweep_task(MemoryDriver::new(), Duration::from_secs(3600));

        drop(shutdown_tx);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("task should exit once the sender is gone")
            .unwrap();
    }
}

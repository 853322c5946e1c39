//! Periodic sync loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::coordinator::SyncCoordinator;

/// Runs [`SyncCoordinator::sync_all`] immediately and then once per interval.
///
/// The interval is measured from the end of one pass to the start of the
/// next, so passes never overlap. Shutdown is observed only between passes.
pub struct SyncScheduler {
    coordinator: Arc<SyncCoordinator>,
    interval: Duration,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SyncScheduler {
    pub fn new(coordinator: Arc<SyncCoordinator>, interval: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            coordinator,
            interval,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            handle: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Start the background loop.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Sync scheduler already running");
            return;
        }

        info!("Starting sync scheduler (interval {:?})", self.interval);

        let coordinator = Arc::clone(&self.coordinator);
        let running = Arc::clone(&self.running);
        let interval = self.interval;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            info!("Sync loop started");
            loop {
                if let Err(e) = coordinator.sync_all().await {
                    warn!("Scheduled sync failed: {}", e);
                }

                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Sync loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                    }
                }
            }
            info!("Sync loop stopped");
        });

        *self.handle.lock().await = Some(handle);
    }

    /// Stop the loop, letting an in-flight pass finish first.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Sync scheduler not running");
            return;
        }

        info!("Stopping sync scheduler");
        let _ = self.shutdown_tx.send(());

        if let Some(handle) = self.handle.lock().await.take() {
            if let Err(e) = handle.await {
                warn!("Sync loop ended abnormally: {}", e);
            }
        }

        info!("Sync scheduler stopped");
    }
}

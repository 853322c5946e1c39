//! Single-flight gate for outbound carrier requests.
//!
//! At most one request runs at a time. After each request completes the gate
//! stays closed for a fixed pacing delay, so consecutive completions are
//! always at least `pacing` apart no matter how many callers are waiting.
//! The hold outlives the caller: a caller dropped mid-request or mid-pacing
//! hands its permit to a background task that finishes the delay.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::{Duration, Instant};
use tracing::{debug, trace};

/// Shared serialization point for every carrier request.
///
/// One instance is created at startup and handed to the sync path and the
/// on-demand paths alike.
#[derive(Debug)]
pub struct RequestGate {
    permit: Arc<Mutex<()>>,
    pacing: Duration,
    completed: AtomicU64,
}

/// Permit held for one request plus its pacing delay.
///
/// Dropping it early moves the remaining delay onto a spawned task, so the
/// next caller never gets in before the delay has run out.
struct PacedPermit {
    permit: Option<OwnedMutexGuard<()>>,
    pacing: Duration,
    release_at: Option<Instant>,
}

impl PacedPermit {
    fn mark_completed(&mut self) {
        self.release_at = Some(Instant::now() + self.pacing);
    }

    async fn release(mut self) {
        if let Some(release_at) = self.release_at {
            tokio::time::sleep_until(release_at).await;
        }
        self.permit.take();
    }
}

impl Drop for PacedPermit {
    fn drop(&mut self) {
        let Some(permit) = self.permit.take() else {
            return;
        };
        let release_at = self
            .release_at
            .unwrap_or_else(|| Instant::now() + self.pacing);
        debug!("Carrier request caller went away, finishing pacing in background");
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep_until(release_at).await;
                    drop(permit);
                });
            }
            Err(_) => drop(permit),
        }
    }
}

impl RequestGate {
    /// Create a gate that holds for `pacing` after every request.
    pub fn new(pacing: Duration) -> Self {
        Self {
            permit: Arc::new(Mutex::new(())),
            pacing,
            completed: AtomicU64::new(0),
        }
    }

    /// Pacing delay enforced after each request.
    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Number of requests that have passed through the gate.
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Run `request` once the gate is free, then hold the gate for the
    /// pacing delay before letting the next caller in.
    pub async fn run<F, T>(&self, request: F) -> T
    where
        F: Future<Output = T>,
    {
        let mut permit = PacedPermit {
            permit: Some(Arc::clone(&self.permit).lock_owned().await),
            pacing: self.pacing,
            release_at: None,
        };
        let result = request.await;
        permit.mark_completed();
        self.completed.fetch_add(1, Ordering::Relaxed);
        trace!(pacing_ms = self.pacing.as_millis() as u64, "Carrier request done, pacing");
        permit.release().await;
        result
    }
}

//! Mock carrier client for testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::carrier::{CarrierClient, CarrierError};
use crate::shipment::{Carrier, StatusSnapshot};

/// A recorded status fetch for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedFetch {
    pub tracking_number: String,
    pub started_at: Instant,
    /// `None` while the fetch is still running.
    pub finished_at: Option<Instant>,
}

/// Mock implementation of the CarrierClient trait.
///
/// Provides controllable behavior for testing:
/// - Scripted snapshots per tracking number, with a fallback default
/// - Per-number or global failures
/// - Artificial latency, call recording and in-flight tracking
///
/// # Example
///
/// ```rust,ignore
/// use parcelwatch_core::testing::MockCarrier;
///
/// let carrier = Arc::new(MockCarrier::new());
/// carrier.set_snapshot("1Z0625ABCDEF123456", StatusSnapshot::delivered()).await;
/// carrier.fail_for("1Z9999999999999999").await;
///
/// // ... run a sync ...
///
/// assert_eq!(carrier.fetch_count().await, 2);
/// assert_eq!(carrier.max_in_flight(), 1);
/// ```
pub struct MockCarrier {
    carrier: Carrier,
    snapshots: Arc<RwLock<HashMap<String, StatusSnapshot>>>,
    default_snapshot: Arc<RwLock<StatusSnapshot>>,
    failures: Arc<RwLock<HashSet<String>>>,
    fail_all: AtomicBool,
    latency: Arc<RwLock<Duration>>,
    fetches: Arc<RwLock<Vec<RecordedFetch>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockCarrier {
    /// Create a UPS mock that reports every shipment as pending with no estimate.
    pub fn new() -> Self {
        Self {
            carrier: Carrier::Ups,
            snapshots: Arc::new(RwLock::new(HashMap::new())),
            default_snapshot: Arc::new(RwLock::new(StatusSnapshot::unchanged())),
            failures: Arc::new(RwLock::new(HashSet::new())),
            fail_all: AtomicBool::new(false),
            latency: Arc::new(RwLock::new(Duration::ZERO)),
            fetches: Arc::new(RwLock::new(Vec::new())),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Script the snapshot returned for one tracking number.
    pub async fn set_snapshot(&self, tracking_number: &str, snapshot: StatusSnapshot) {
        self.snapshots
            .write()
            .await
            .insert(tracking_number.to_string(), snapshot);
    }

    /// Snapshot returned for tracking numbers without a scripted one.
    pub async fn set_default_snapshot(&self, snapshot: StatusSnapshot) {
        *self.default_snapshot.write().await = snapshot;
    }

    /// Make fetches for one tracking number fail.
    pub async fn fail_for(&self, tracking_number: &str) {
        self.failures
            .write()
            .await
            .insert(tracking_number.to_string());
    }

    pub async fn clear_failure(&self, tracking_number: &str) {
        self.failures.write().await.remove(tracking_number);
    }

    /// Make every fetch fail.
    pub fn set_fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Delay applied to every fetch.
    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.write().await = latency;
    }

    /// Get all recorded fetches, in start order.
    pub async fn recorded_fetches(&self) -> Vec<RecordedFetch> {
        self.fetches.read().await.clone()
    }

    pub async fn fetch_count(&self) -> usize {
        self.fetches.read().await.len()
    }

    /// Highest number of fetches observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockCarrier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CarrierClient for MockCarrier {
    fn carrier(&self) -> Carrier {
        self.carrier
    }

    async fn fetch(&self, tracking_number: &str) -> Result<StatusSnapshot, CarrierError> {
        let slot = {
            let mut fetches = self.fetches.write().await;
            fetches.push(RecordedFetch {
                tracking_number: tracking_number.to_string(),
                started_at: Instant::now(),
                finished_at: None,
            });
            fetches.len() - 1
        };

        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        let latency = *self.latency.read().await;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let result = if self.fail_all.load(Ordering::SeqCst)
            || self.failures.read().await.contains(tracking_number)
        {
            Err(CarrierError::ConnectionFailed(format!(
                "mock failure for {}",
                tracking_number
            )))
        } else {
            let scripted = self.snapshots.read().await.get(tracking_number).cloned();
            match scripted {
                Some(snapshot) => Ok(snapshot),
                None => Ok(self.default_snapshot.read().await.clone()),
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if let Some(fetch) = self.fetches.write().await.get_mut(slot) {
            fetch.finished_at = Some(Instant::now());
        }

        result
    }
}

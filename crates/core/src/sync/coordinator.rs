//! Sync coordinator implementation.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::carrier::{CarrierError, CarrierRegistry, RequestGate};
use crate::metrics;
use crate::shipment::{
    Carrier, ShipmentRecord, ShipmentStore, StatusSnapshot, StoreError,
};

use super::types::{NewShipment, SyncError, SyncSummary};

/// Checks shipments with their carriers and merges results into the store.
///
/// Every carrier request goes through the shared [`RequestGate`], whether it
/// comes from a batch pass, a single check or an import backfill.
pub struct SyncCoordinator {
    store: Arc<dyn ShipmentStore>,
    carriers: CarrierRegistry,
    gate: Arc<RequestGate>,
}

impl SyncCoordinator {
    /// Create a new coordinator.
    pub fn new(
        store: Arc<dyn ShipmentStore>,
        carriers: CarrierRegistry,
        gate: Arc<RequestGate>,
    ) -> Self {
        Self {
            store,
            carriers,
            gate,
        }
    }

    pub fn store(&self) -> &Arc<dyn ShipmentStore> {
        &self.store
    }

    pub fn gate(&self) -> &Arc<RequestGate> {
        &self.gate
    }

    /// All tracked shipments.
    pub fn list_all(&self) -> Result<Vec<ShipmentRecord>, SyncError> {
        Ok(self.store.list()?)
    }

    /// One shipment by tracking number.
    pub fn get(&self, tracking_number: &str) -> Result<ShipmentRecord, SyncError> {
        self.store
            .get(tracking_number)?
            .ok_or_else(|| SyncError::NotFound(tracking_number.to_string()))
    }

    /// Start tracking a shipment. Fails if the tracking number is already known.
    pub fn add_direct(&self, shipment: NewShipment) -> Result<ShipmentRecord, SyncError> {
        let tracking_number = shipment.tracking_number.trim();
        if tracking_number.is_empty() {
            return Err(SyncError::InvalidTrackingNumber(shipment.tracking_number));
        }

        let record = ShipmentRecord::new(shipment.carrier, tracking_number)
            .with_provenance(shipment.store_id.trim(), shipment.request_id.trim());

        if !self.store.insert(record.clone())? {
            return Err(SyncError::AlreadyExists(tracking_number.to_string()));
        }

        info!(
            tracking_number = tracking_number,
            carrier = %shipment.carrier,
            "Shipment added"
        );
        metrics::TRACKED_SHIPMENTS.inc();
        Ok(record)
    }

    /// Stop tracking a shipment. Returns `false` if it was not tracked.
    pub fn delete(&self, tracking_number: &str) -> Result<bool, SyncError> {
        let removed = self.store.remove(tracking_number)?;
        if removed {
            info!(tracking_number = tracking_number, "Shipment deleted");
            metrics::TRACKED_SHIPMENTS.dec();
        } else {
            debug!(tracking_number = tracking_number, "Delete of unknown shipment ignored");
        }
        Ok(removed)
    }

    /// Check a single shipment now and return the merged record.
    ///
    /// Unknown tracking numbers fail without any carrier request. Carrier
    /// failures are logged and returned to the caller.
    pub async fn check_one(&self, tracking_number: &str) -> Result<ShipmentRecord, SyncError> {
        let record = self.get(tracking_number)?;

        let snapshot = match self.fetch_gated(record.carrier, tracking_number).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    tracking_number = tracking_number,
                    error = %e,
                    "Status check failed"
                );
                metrics::STATUS_CHECKS.with_label_values(&["failed"]).inc();
                return Err(SyncError::Carrier {
                    tracking_number: tracking_number.to_string(),
                    source: e,
                });
            }
        };

        let updated = self
            .store
            .apply_snapshot(tracking_number, &snapshot, Utc::now())
            .map_err(|e| match e {
                StoreError::NotFound(tn) => SyncError::NotFound(tn),
                other => SyncError::Store(other),
            })?;

        record_check_result(&updated);
        info!(
            tracking_number = tracking_number,
            status = updated.status.as_str(),
            estimate = %updated.estimated_delivery,
            "Status checked"
        );
        Ok(updated)
    }

    /// Check every tracked shipment, one carrier request at a time.
    ///
    /// A failed check counts as "no change" for that record and never stops
    /// the pass. Only an unreadable store fails the whole call.
    pub async fn sync_all(&self) -> Result<SyncSummary, SyncError> {
        let started = Instant::now();
        let records = self.store.list()?;
        info!("Sync started for {} shipments", records.len());

        let mut summary = SyncSummary::default();

        for record in &records {
            summary.checked += 1;
            let tracking_number = record.tracking_number.as_str();

            let (snapshot, fetched) = match self.fetch_gated(record.carrier, tracking_number).await {
                Ok(snapshot) => (snapshot, true),
                Err(e) => {
                    warn!(
                        tracking_number = tracking_number,
                        error = %e,
                        "Status check failed, keeping previous status"
                    );
                    metrics::STATUS_CHECKS.with_label_values(&["failed"]).inc();
                    summary.failed += 1;
                    (StatusSnapshot::unchanged(), false)
                }
            };

            match self
                .store
                .apply_snapshot(tracking_number, &snapshot, Utc::now())
            {
                Ok(updated) => {
                    if updated.is_delivered() {
                        summary.delivered += 1;
                    }
                    if updated.status != record.status {
                        info!(
                            tracking_number = tracking_number,
                            "Shipment delivered"
                        );
                    }
                    if fetched {
                        record_check_result(&updated);
                    }
                }
                Err(StoreError::NotFound(_)) => {
                    debug!(
                        tracking_number = tracking_number,
                        "Shipment deleted during sync, skipping"
                    );
                }
                Err(e) => {
                    warn!(
                        tracking_number = tracking_number,
                        error = %e,
                        "Failed to store status update"
                    );
                }
            }
        }

        metrics::SYNC_RUNS.inc();
        metrics::SYNC_DURATION.observe(started.elapsed().as_secs_f64());
        if let Ok(count) = self.store.len() {
            metrics::TRACKED_SHIPMENTS.set(count as i64);
        }

        info!(
            checked = summary.checked,
            delivered = summary.delivered,
            failed = summary.failed,
            "Sync finished in {:?}",
            started.elapsed()
        );
        Ok(summary)
    }

    async fn fetch_gated(
        &self,
        carrier: Carrier,
        tracking_number: &str,
    ) -> Result<StatusSnapshot, CarrierError> {
        self.gate
            .run(self.carriers.fetch(carrier, tracking_number))
            .await
    }
}

fn record_check_result(record: &ShipmentRecord) {
    let result = if record.is_delivered() {
        "delivered"
    } else {
        "pending"
    };
    metrics::STATUS_CHECKS.with_label_values(&[result]).inc();
}

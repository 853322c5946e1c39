//! In-memory record store for testing.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::shipment::{ShipmentRecord, ShipmentStore, StatusSnapshot, StoreError};

/// ShipmentStore kept entirely in memory.
///
/// Counts successful writes and can be told to fail them, which stands in
/// for an unwritable backing file.
#[derive(Default)]
pub struct MockShipmentStore {
    records: Mutex<Vec<ShipmentRecord>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MockShipmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with `records`.
    pub fn with_records(records: Vec<ShipmentRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of mutations that reached "disk".
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<ShipmentRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Persistence("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Persistence("mock write failure".to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl ShipmentStore for MockShipmentStore {
    fn list(&self) -> Result<Vec<ShipmentRecord>, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn get(&self, tracking_number: &str) -> Result<Option<ShipmentRecord>, StoreError> {
        Ok(self
            .lock()?
            .iter()
            .find(|r| r.tracking_number == tracking_number)
            .cloned())
    }

    fn insert(&self, record: ShipmentRecord) -> Result<bool, StoreError> {
        let mut records = self.lock()?;
        if records
            .iter()
            .any(|r| r.tracking_number == record.tracking_number)
        {
            return Ok(false);
        }
        self.write()?;
        records.push(record);
        Ok(true)
    }

    fn remove(&self, tracking_number: &str) -> Result<bool, StoreError> {
        let mut records = self.lock()?;
        let Some(pos) = records
            .iter()
            .position(|r| r.tracking_number == tracking_number)
        else {
            return Ok(false);
        };
        self.write()?;
        records.remove(pos);
        Ok(true)
    }

    fn apply_snapshot(
        &self,
        tracking_number: &str,
        snapshot: &StatusSnapshot,
        checked_at: DateTime<Utc>,
    ) -> Result<ShipmentRecord, StoreError> {
        let mut records = self.lock()?;
        let record = records
            .iter_mut()
            .find(|r| r.tracking_number == tracking_number)
            .ok_or_else(|| StoreError::NotFound(tracking_number.to_string()))?;

        let mut updated = record.clone();
        updated.apply_snapshot(snapshot, checked_at);
        self.write()?;
        *record = updated.clone();
        Ok(updated)
    }
}

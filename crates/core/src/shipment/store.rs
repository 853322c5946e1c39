//! Record store trait and error type.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::{ShipmentRecord, StatusSnapshot};

/// Error type for record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record with this tracking number.
    #[error("Shipment not found: {0}")]
    NotFound(String),

    /// The backing file could not be written.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// Trait for shipment record storage backends.
///
/// Every mutating call is durable once it returns `Ok`.
pub trait ShipmentStore: Send + Sync {
    /// All records in insertion order.
    fn list(&self) -> Result<Vec<ShipmentRecord>, StoreError>;

    /// Get a record by tracking number.
    fn get(&self, tracking_number: &str) -> Result<Option<ShipmentRecord>, StoreError>;

    /// Whether a record with this tracking number exists.
    fn contains(&self, tracking_number: &str) -> Result<bool, StoreError> {
        Ok(self.get(tracking_number)?.is_some())
    }

    /// Insert a record unless its tracking number is already present.
    /// Returns `false` (and changes nothing) for a duplicate.
    fn insert(&self, record: ShipmentRecord) -> Result<bool, StoreError>;

    /// Remove a record. Returns `false` if it was not present.
    fn remove(&self, tracking_number: &str) -> Result<bool, StoreError>;

    /// Merge a status snapshot into an existing record and return the result.
    fn apply_snapshot(
        &self,
        tracking_number: &str,
        snapshot: &StatusSnapshot,
        checked_at: DateTime<Utc>,
    ) -> Result<ShipmentRecord, StoreError>;

    /// Number of records.
    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.list()?.len())
    }

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

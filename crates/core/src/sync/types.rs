//! Types for status synchronization.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::carrier::CarrierError;
use crate::shipment::{Carrier, StoreError};

/// Errors surfaced by synchronization operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Shipment not found.
    #[error("shipment not found: {0}")]
    NotFound(String),

    /// A shipment with this tracking number is already tracked.
    #[error("shipment already exists: {0}")]
    AlreadyExists(String),

    /// Tracking number is empty or malformed.
    #[error("invalid tracking number: {0:?}")]
    InvalidTrackingNumber(String),

    /// Carrier check failed.
    #[error("carrier check failed for {tracking_number}: {source}")]
    Carrier {
        tracking_number: String,
        #[source]
        source: CarrierError,
    },

    /// Record store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Request to start tracking a shipment directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShipment {
    pub carrier: Carrier,
    pub tracking_number: String,
    #[serde(default)]
    pub store_id: String,
    #[serde(default)]
    pub request_id: String,
}

impl NewShipment {
    pub fn new(carrier: Carrier, tracking_number: impl Into<String>) -> Self {
        Self {
            carrier,
            tracking_number: tracking_number.into(),
            store_id: String::new(),
            request_id: String::new(),
        }
    }
}

/// Outcome of one full sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Records a check was attempted for.
    pub checked: usize,
    /// Records that are delivered after the pass.
    pub delivered: usize,
    /// Checks that failed and were treated as "no change".
    pub failed: usize,
}

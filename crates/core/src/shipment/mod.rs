//! Shipment records and the durable record store.

mod json_store;
mod store;
mod types;

pub use json_store::JsonFileStore;
pub use store::{ShipmentStore, StoreError};
pub use types::{
    Carrier, ShipmentRecord, ShipmentStatus, StatusSnapshot, UNKNOWN_ESTIMATE,
};

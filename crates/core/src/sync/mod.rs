//! Status synchronization.
//!
//! The coordinator checks every tracked shipment with its carrier, one
//! request at a time through the shared gate, and merges the results into
//! the record store. The scheduler repeats that on a fixed period:
//! - **Batch** (`sync_all`): single failures are logged and skipped
//! - **Single** (`check_one`): failures surface to the caller

mod coordinator;
mod scheduler;
mod types;

pub use coordinator::SyncCoordinator;
pub use scheduler::SyncScheduler;
pub use types::{NewShipment, SyncError, SyncSummary};

//! Shipment discovery from helpdesk tickets.
//!
//! A browser session logs into the helpdesk portal, walks the inbox, and
//! mines ticket bodies for tracking numbers. The portal is reached only
//! through the [`TicketPortal`] capability trait so the filtering,
//! extraction and dedup logic in [`DiscoveryImporter`] runs unchanged
//! against a fake portal in tests.

mod chromium;
mod extract;
mod importer;
mod types;

pub use chromium::{ChromiumLauncher, ChromiumPortal};
pub use extract::{
    find_tracking_numbers, last_tracking_number, requester_id, subject_has_marker,
};
pub use importer::{DiscoveryImporter, DiscoverySettings};
pub use types::{
    CandidateTicket, ImportError, ImportReport, PortalCredentials, PortalError, PortalLauncher,
    TicketPortal,
};

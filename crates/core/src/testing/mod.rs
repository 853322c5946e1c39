//! Testing utilities and mock implementations.
//!
//! Mocks for every external seam (carrier endpoint, helpdesk portal, record
//! store) so sync and discovery can be exercised end to end in-process.
//!
//! # Example
//!
//! ```rust,ignore
//! use parcelwatch_core::testing::{fixtures, MockCarrier, MockPortalLauncher};
//!
//! let carrier = Arc::new(MockCarrier::new());
//! let coordinator = fixtures::coordinator(fixtures::memory_store(), carrier.clone());
//!
//! carrier.set_snapshot("1Z0625ABCDEF123456", StatusSnapshot::delivered()).await;
//! ```

mod mock_carrier;
mod mock_portal;
mod mock_store;

pub use mock_carrier::{MockCarrier, RecordedFetch};
pub use mock_portal::{MockPortalLauncher, MockTicketPortal};
pub use mock_store::MockShipmentStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::carrier::{CarrierClient, CarrierRegistry, RequestGate};
    use crate::shipment::{Carrier, ShipmentRecord, ShipmentStore};
    use crate::sync::SyncCoordinator;

    use super::MockShipmentStore;

    /// Empty in-memory store.
    pub fn memory_store() -> Arc<dyn ShipmentStore> {
        Arc::new(MockShipmentStore::new())
    }

    /// Pending UPS record with no provenance.
    pub fn ups_record(tracking_number: &str) -> ShipmentRecord {
        ShipmentRecord::new(Carrier::Ups, tracking_number)
    }

    /// Coordinator over `store` and `carrier` with a pacing-free gate.
    pub fn coordinator(
        store: Arc<dyn ShipmentStore>,
        carrier: Arc<dyn CarrierClient>,
    ) -> Arc<SyncCoordinator> {
        paced_coordinator(store, carrier, Duration::ZERO)
    }

    /// Coordinator whose gate holds for `pacing` after each request.
    pub fn paced_coordinator(
        store: Arc<dyn ShipmentStore>,
        carrier: Arc<dyn CarrierClient>,
        pacing: Duration,
    ) -> Arc<SyncCoordinator> {
        Arc::new(SyncCoordinator::new(
            store,
            CarrierRegistry::new().with_client(carrier),
            Arc::new(RequestGate::new(pacing)),
        ))
    }

    /// Ticket body in the shape the helpdesk renders.
    pub fn ticket_body(lines: &[&str]) -> String {
        let mut body = String::from("Ticket details\n");
        for line in lines {
            body.push_str(line);
            body.push('\n');
        }
        body
    }

    /// Carrier page carrying the estimated-delivery landmark pair.
    pub fn ups_page(estimate: Option<&str>, delivered: bool) -> String {
        let mut page = String::from("<html><body><div class=\"sonuc\">");
        if let Some(estimate) = estimate {
            page.push_str(&format!(
                "<span id=\"ctl00_MainContent_Label2\">Öngörülen Teslimat Zamanı</span><br/>\
                 <span id=\"ctl00_MainContent_teslimat_zamani\">{}</span>",
                estimate
            ));
        }
        if delivered {
            page.push_str("<p>Paketiniz teslim edilmiştir.</p>");
        }
        page.push_str("</div></body></html>");
        page
    }
}

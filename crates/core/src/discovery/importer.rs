//! Discovery importer implementation.
//!
//! One import run:
//! - Authenticate against the portal (fatal on failure)
//! - Filter inbox rows by team label and subject marker
//! - Read each ticket, keep its last tracking number, add unseen ones
//! - Close the session, then give every new shipment an initial status check

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::PortalConfig;
use crate::metrics;
use crate::shipment::{Carrier, ShipmentRecord, StoreError};
use crate::sync::SyncCoordinator;

use super::extract::{last_tracking_number, requester_id, subject_has_marker};
use super::types::{
    CandidateTicket, ImportError, ImportReport, PortalCredentials, PortalError, PortalLauncher,
    TicketPortal,
};

/// Row filters applied before any ticket is opened.
#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    /// Only rows with exactly this team label are considered.
    pub team_filter: String,
    /// Subjects must start with this marker.
    pub subject_marker: String,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            team_filter: "ServiceDesk".to_string(),
            subject_marker: "#".to_string(),
        }
    }
}

impl From<&PortalConfig> for DiscoverySettings {
    fn from(config: &PortalConfig) -> Self {
        Self {
            team_filter: config.team_filter.clone(),
            subject_marker: config.subject_marker.clone(),
        }
    }
}

/// Mines helpdesk tickets for tracking numbers and starts tracking new ones.
pub struct DiscoveryImporter {
    launcher: Arc<dyn PortalLauncher>,
    coordinator: Arc<SyncCoordinator>,
    settings: DiscoverySettings,
    default_credentials: Option<PortalCredentials>,
}

impl DiscoveryImporter {
    pub fn new(
        launcher: Arc<dyn PortalLauncher>,
        coordinator: Arc<SyncCoordinator>,
        settings: DiscoverySettings,
    ) -> Self {
        Self {
            launcher,
            coordinator,
            settings,
            default_credentials: None,
        }
    }

    /// Credentials used when an import is started without any.
    pub fn with_default_credentials(mut self, credentials: PortalCredentials) -> Self {
        self.default_credentials = Some(credentials);
        self
    }

    pub fn settings(&self) -> &DiscoverySettings {
        &self.settings
    }

    /// Run one import and return the shipments it added.
    ///
    /// The browser session is closed before returning, whatever the outcome.
    pub async fn import(
        &self,
        credentials: Option<PortalCredentials>,
    ) -> Result<ImportReport, ImportError> {
        let credentials = credentials
            .filter(|c| !c.email.trim().is_empty())
            .or_else(|| self.default_credentials.clone())
            .ok_or(ImportError::MissingCredentials)?;

        info!("Starting ticket portal import as {}", credentials.email);

        let mut portal = match self.launcher.launch().await {
            Ok(portal) => portal,
            Err(e) => {
                error!("Failed to open portal session: {}", e);
                metrics::PORTAL_IMPORTS.with_label_values(&["failed"]).inc();
                return Err(ImportError::Session(e));
            }
        };

        let outcome = self.discover(portal.as_mut(), &credentials).await;

        if let Err(e) = portal.close().await {
            warn!("Failed to close portal session: {}", e);
        }

        let added = match outcome {
            Ok(added) => added,
            Err(e) => {
                let label = match e {
                    ImportError::Authentication(_) => "auth_failed",
                    _ => "failed",
                };
                metrics::PORTAL_IMPORTS.with_label_values(&[label]).inc();
                error!("Ticket portal import failed: {}", e);
                return Err(e);
            }
        };

        let records = self.backfill(added).await;
        metrics::PORTAL_IMPORTS.with_label_values(&["success"]).inc();
        info!("Ticket portal import finished, {} new shipments", records.len());

        Ok(ImportReport {
            added_count: records.len(),
            records,
        })
    }

    /// Run [`Self::import`] on its own task.
    ///
    /// Dropping the returned future does not cut the run short: the session
    /// is still closed and new shipments still get their initial check.
    pub async fn import_detached(
        self: &Arc<Self>,
        credentials: Option<PortalCredentials>,
    ) -> Result<ImportReport, ImportError> {
        let importer = Arc::clone(self);
        tokio::spawn(async move { importer.import(credentials).await })
            .await
            .map_err(|e| {
                ImportError::Session(PortalError::Session(format!("import task failed: {}", e)))
            })?
    }

    async fn discover(
        &self,
        portal: &mut dyn TicketPortal,
        credentials: &PortalCredentials,
    ) -> Result<Vec<ShipmentRecord>, ImportError> {
        portal
            .authenticate(credentials)
            .await
            .map_err(|e| match e {
                PortalError::Authentication(reason) => ImportError::Authentication(reason),
                other => ImportError::Authentication(other.to_string()),
            })?;
        info!("Portal authentication succeeded");

        let rows = portal.list_candidate_tickets().await?;
        let candidates: Vec<CandidateTicket> = rows
            .into_iter()
            .filter(|row| row.team.trim() == self.settings.team_filter)
            .collect();
        info!(
            "{} inbox rows for team {}",
            candidates.len(),
            self.settings.team_filter
        );

        let mut seen = HashSet::new();
        let mut added = Vec::new();

        for ticket in &candidates {
            if !subject_has_marker(&ticket.subject, &self.settings.subject_marker) {
                debug!(ticket_id = %ticket.ticket_id, "Subject without marker, skipping");
                continue;
            }

            let content = match portal.read_ticket_content(ticket).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(
                        ticket_id = %ticket.ticket_id,
                        error = %e,
                        "Failed to read ticket, skipping"
                    );
                    metrics::TICKETS_SKIPPED.inc();
                    return_to_inbox(portal, ticket).await;
                    continue;
                }
            };

            if let Some(record) = self.record_from_ticket(ticket, &content, &mut seen) {
                added.push(record);
            }

            return_to_inbox(portal, ticket).await;
        }

        Ok(added)
    }

    /// Turn a ticket's content into a new record, unless its tracking number
    /// is missing or already known. Store failures skip the ticket.
    fn record_from_ticket(
        &self,
        ticket: &CandidateTicket,
        content: &str,
        seen: &mut HashSet<String>,
    ) -> Option<ShipmentRecord> {
        let Some(tracking_number) = last_tracking_number(content) else {
            debug!(ticket_id = %ticket.ticket_id, "No tracking number in ticket");
            return None;
        };

        if !seen.insert(tracking_number.clone()) {
            debug!(
                ticket_id = %ticket.ticket_id,
                tracking_number = %tracking_number,
                "Tracking number already added in this import"
            );
            return None;
        }

        let store = self.coordinator.store();
        match store.contains(&tracking_number) {
            Ok(false) => {}
            Ok(true) => {
                debug!(
                    ticket_id = %ticket.ticket_id,
                    tracking_number = %tracking_number,
                    "Tracking number already tracked"
                );
                return None;
            }
            Err(e) => {
                skip_on_store_error(ticket, &tracking_number, &e);
                return None;
            }
        }

        let store_id = requester_id(&ticket.requester).unwrap_or_default();
        let record = ShipmentRecord::new(Carrier::Ups, tracking_number.as_str())
            .with_provenance(store_id, ticket.ticket_id.as_str());

        match store.insert(record.clone()) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                skip_on_store_error(ticket, &tracking_number, &e);
                return None;
            }
        }

        info!(
            ticket_id = %ticket.ticket_id,
            tracking_number = %tracking_number,
            store_id = store_id,
            "Discovered new shipment"
        );
        metrics::SHIPMENTS_DISCOVERED.inc();
        metrics::TRACKED_SHIPMENTS.inc();
        Some(record)
    }

    /// Check each new shipment once, in order, through the shared gate.
    async fn backfill(&self, added: Vec<ShipmentRecord>) -> Vec<ShipmentRecord> {
        let mut records = Vec::with_capacity(added.len());
        for record in added {
            match self.coordinator.check_one(&record.tracking_number).await {
                Ok(updated) => records.push(updated),
                Err(e) => {
                    warn!(
                        tracking_number = %record.tracking_number,
                        error = %e,
                        "Initial status check failed"
                    );
                    records.push(record);
                }
            }
        }
        records
    }
}

fn skip_on_store_error(ticket: &CandidateTicket, tracking_number: &str, error: &StoreError) {
    warn!(
        ticket_id = %ticket.ticket_id,
        tracking_number = %tracking_number,
        error = %error,
        "Failed to store discovered shipment, skipping ticket"
    );
    metrics::TICKETS_SKIPPED.inc();
}

async fn return_to_inbox(portal: &mut dyn TicketPortal, ticket: &CandidateTicket) {
    if let Err(e) = portal.go_back().await {
        warn!(
            ticket_id = %ticket.ticket_id,
            error = %e,
            "Failed to return to inbox"
        );
    }
}

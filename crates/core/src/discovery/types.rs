//! Types for ticket discovery.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shipment::ShipmentRecord;

/// Portal login credentials.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct PortalCredentials {
    pub email: String,
    pub password: String,
}

impl PortalCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for PortalCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One inbox row as read from the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTicket {
    /// Row position in the inbox, used to find the row again after navigating back.
    pub index: usize,
    pub ticket_id: String,
    /// Raw requester cell; the requester id is its first token.
    pub requester: String,
    pub subject: String,
    /// Team/category label.
    pub team: String,
}

/// Errors raised by a portal session.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("Failed to start browser session: {0}")]
    Launch(String),

    #[error("Portal authentication failed: {0}")]
    Authentication(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error("Browser session error: {0}")]
    Session(String),
}

/// Errors that end a whole import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("No portal credentials supplied or configured")]
    MissingCredentials,

    #[error("Portal authentication failed: {0}")]
    Authentication(String),

    #[error("Portal session failed: {0}")]
    Session(#[from] PortalError),
}

/// Result of one import run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub added_count: usize,
    /// Newly added records, after their initial status check.
    pub records: Vec<ShipmentRecord>,
}

/// Capability interface over an authenticated helpdesk browser session.
#[async_trait]
pub trait TicketPortal: Send {
    /// Run the multi-step login flow and wait for the inbox.
    async fn authenticate(&mut self, credentials: &PortalCredentials) -> Result<(), PortalError>;

    /// Read every inbox row.
    async fn list_candidate_tickets(&mut self) -> Result<Vec<CandidateTicket>, PortalError>;

    /// Open a ticket and return its full rendered text.
    async fn read_ticket_content(&mut self, ticket: &CandidateTicket)
        -> Result<String, PortalError>;

    /// Return from a ticket to the inbox.
    async fn go_back(&mut self) -> Result<(), PortalError>;

    /// Tear the session down.
    async fn close(&mut self) -> Result<(), PortalError>;
}

/// Opens fresh portal sessions, one per import.
#[async_trait]
pub trait PortalLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn TicketPortal>, PortalError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = PortalCredentials::new("ops@example.com", "hunter2");
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("ops@example.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_import_report_serialization() {
        let report = ImportReport {
            added_count: 0,
            records: vec![],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["addedCount"], 0);
        assert!(json["records"].as_array().unwrap().is_empty());
    }
}

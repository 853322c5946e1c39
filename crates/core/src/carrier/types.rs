//! Types for carrier status fetching.

use async_trait::async_trait;
use thiserror::Error;

use crate::shipment::{Carrier, StatusSnapshot};

/// Errors that can occur while checking a shipment with its carrier.
#[derive(Debug, Error)]
pub enum CarrierError {
    #[error("Carrier connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Carrier returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Carrier request failed: {0}")]
    Request(String),

    #[error("Request timeout")]
    Timeout,

    #[error("No client registered for carrier {0}")]
    Unsupported(Carrier),
}

impl From<reqwest::Error> for CarrierError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CarrierError::Timeout
        } else if e.is_connect() {
            CarrierError::ConnectionFailed(e.to_string())
        } else if let Some(status) = e.status() {
            CarrierError::HttpStatus {
                status: status.as_u16(),
            }
        } else {
            CarrierError::Request(e.to_string())
        }
    }
}

/// Trait for carrier status backends.
#[async_trait]
pub trait CarrierClient: Send + Sync {
    /// Carrier this client handles.
    fn carrier(&self) -> Carrier;

    /// Fetch the current status of one shipment.
    ///
    /// Issues exactly one outbound request. Callers are responsible for
    /// serializing requests through the shared gate.
    async fn fetch(&self, tracking_number: &str) -> Result<StatusSnapshot, CarrierError>;
}

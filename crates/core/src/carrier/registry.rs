//! Carrier client lookup.

use std::collections::HashMap;
use std::sync::Arc;

use crate::shipment::{Carrier, StatusSnapshot};

use super::{CarrierClient, CarrierError};

/// Maps each [`Carrier`] to the client that knows how to read its pages.
#[derive(Default, Clone)]
pub struct CarrierRegistry {
    clients: HashMap<Carrier, Arc<dyn CarrierClient>>,
}

impl CarrierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client, replacing any previous one for the same carrier.
    pub fn with_client(mut self, client: Arc<dyn CarrierClient>) -> Self {
        self.register(client);
        self
    }

    pub fn register(&mut self, client: Arc<dyn CarrierClient>) {
        self.clients.insert(client.carrier(), client);
    }

    pub fn get(&self, carrier: Carrier) -> Option<&Arc<dyn CarrierClient>> {
        self.clients.get(&carrier)
    }

    /// Fetch the status of `tracking_number` from `carrier`.
    pub async fn fetch(
        &self,
        carrier: Carrier,
        tracking_number: &str,
    ) -> Result<StatusSnapshot, CarrierError> {
        let client = self
            .clients
            .get(&carrier)
            .ok_or(CarrierError::Unsupported(carrier))?;
        client.fetch(tracking_number).await
    }
}

impl std::fmt::Debug for CarrierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarrierRegistry")
            .field("carriers", &self.clients.keys().collect::<Vec<_>>())
            .finish()
    }
}

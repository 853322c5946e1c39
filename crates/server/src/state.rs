use std::sync::Arc;

use parcelwatch_core::{Config, DiscoveryImporter, SanitizedConfig, SyncCoordinator};

/// Shared application state
pub struct AppState {
    config: Config,
    coordinator: Arc<SyncCoordinator>,
    /// Present only when a `[portal]` section is configured.
    importer: Option<Arc<DiscoveryImporter>>,
}

impl AppState {
    pub fn new(
        config: Config,
        coordinator: Arc<SyncCoordinator>,
        importer: Option<Arc<DiscoveryImporter>>,
    ) -> Self {
        Self {
            config,
            coordinator,
            importer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn coordinator(&self) -> &Arc<SyncCoordinator> {
        &self.coordinator
    }

    pub fn importer(&self) -> Option<&Arc<DiscoveryImporter>> {
        self.importer.as_ref()
    }
}

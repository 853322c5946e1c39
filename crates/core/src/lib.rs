pub mod carrier;
pub mod config;
pub mod discovery;
pub mod metrics;
pub mod shipment;
pub mod sync;
pub mod testing;

pub use carrier::{CarrierClient, CarrierError, CarrierRegistry, RequestGate, UpsCarrier};
pub use config::{
    load_config, load_config_from_str, validate_config, CarriersConfig, Config, ConfigError,
    PortalConfig, PortalSelectors, SanitizedConfig, ServerConfig, StoreConfig, SyncConfig,
    UpsConfig,
};
pub use discovery::{
    CandidateTicket, ChromiumLauncher, DiscoveryImporter, DiscoverySettings, ImportError,
    ImportReport, PortalCredentials, PortalError, PortalLauncher, TicketPortal,
};
pub use shipment::{
    Carrier, JsonFileStore, ShipmentRecord, ShipmentStatus, ShipmentStore, StatusSnapshot,
    StoreError,
};
pub use sync::{NewShipment, SyncCoordinator, SyncError, SyncScheduler, SyncSummary};

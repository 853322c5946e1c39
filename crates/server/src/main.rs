use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parcelwatch_core::{
    load_config, metrics, validate_config, CarrierRegistry, ChromiumLauncher, Config,
    DiscoveryImporter, DiscoverySettings, JsonFileStore, PortalCredentials, RequestGate,
    ShipmentStore, SyncCoordinator, SyncScheduler, UpsCarrier,
};
use parcelwatch_server::api::create_router;
use parcelwatch_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("PARCELWATCH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Store path: {:?}", config.store.path);

    // Record store
    let store: Arc<dyn ShipmentStore> = Arc::new(JsonFileStore::load(&config.store.path));
    let tracked = store.len().context("Failed to read shipment store")?;
    metrics::TRACKED_SHIPMENTS.set(tracked as i64);
    info!("Tracking {} shipments", tracked);

    // Carriers
    let ups = UpsCarrier::new(config.carriers.ups.clone()).context("Failed to create UPS client")?;
    let carriers = CarrierRegistry::new().with_client(Arc::new(ups));

    let gate = Arc::new(RequestGate::new(Duration::from_millis(config.sync.pacing_ms)));
    let coordinator = Arc::new(SyncCoordinator::new(store, carriers, gate));

    let importer = create_importer(&config, &coordinator);

    // Start scheduler
    let scheduler = if config.sync.enabled {
        let scheduler = SyncScheduler::new(
            Arc::clone(&coordinator),
            Duration::from_secs(config.sync.interval_secs),
        );
        scheduler.start().await;
        Some(scheduler)
    } else {
        info!("Scheduled sync disabled");
        None
    };

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, coordinator, importer));

    // Create router
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop scheduler if running
    if let Some(ref scheduler) = scheduler {
        info!("Stopping sync scheduler...");
        scheduler.stop().await;
    }

    info!("Server shut down");
    Ok(())
}

/// Build the ticket importer when a portal is configured.
fn create_importer(
    config: &Config,
    coordinator: &Arc<SyncCoordinator>,
) -> Option<Arc<DiscoveryImporter>> {
    let Some(portal) = config.portal.as_ref() else {
        info!("Ticket portal not configured, import disabled");
        return None;
    };

    let mut importer = DiscoveryImporter::new(
        Arc::new(ChromiumLauncher::new(portal.clone())),
        Arc::clone(coordinator),
        DiscoverySettings::from(portal),
    );

    match (&portal.email, &portal.password) {
        (Some(email), Some(password)) => {
            importer = importer.with_default_credentials(PortalCredentials::new(
                email.as_str(),
                password.as_str(),
            ));
        }
        (Some(_), None) | (None, Some(_)) => {
            warn!("Portal email and password must both be set to use default credentials");
        }
        (None, None) => {}
    }

    info!("Ticket portal import enabled for {}", portal.url);
    Some(Arc::new(importer))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

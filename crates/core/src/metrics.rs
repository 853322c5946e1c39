//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Carrier status checks (results, sync passes)
//! - Ticket discovery (imports, shipments discovered)

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// Status Checks
// =============================================================================

/// Carrier status checks by result.
pub static STATUS_CHECKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("parcelwatch_status_checks_total", "Total carrier status checks"),
        &["result"], // "delivered", "pending", "failed"
    )
    .unwrap()
});

/// Completed sync passes.
pub static SYNC_RUNS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("parcelwatch_sync_runs_total", "Total completed sync passes").unwrap()
});

/// Sync pass duration in seconds.
pub static SYNC_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("parcelwatch_sync_duration_seconds", "Duration of a sync pass")
            .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
    )
    .unwrap()
});

/// Shipments currently tracked.
pub static TRACKED_SHIPMENTS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("parcelwatch_tracked_shipments", "Number of tracked shipments").unwrap()
});

// =============================================================================
// Discovery
// =============================================================================

/// Portal imports by result.
pub static PORTAL_IMPORTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("parcelwatch_portal_imports_total", "Total ticket portal imports"),
        &["result"], // "success", "auth_failed", "failed"
    )
    .unwrap()
});

/// Shipments created by ticket discovery.
pub static SHIPMENTS_DISCOVERED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "parcelwatch_shipments_discovered_total",
        "Total shipments discovered in helpdesk tickets",
    )
    .unwrap()
});

/// Ticket rows skipped because processing them failed.
pub static TICKETS_SKIPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "parcelwatch_tickets_skipped_total",
        "Ticket rows skipped after a processing failure",
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry.register(Box::new(STATUS_CHECKS.clone())).unwrap();
    registry.register(Box::new(SYNC_RUNS.clone())).unwrap();
    registry.register(Box::new(SYNC_DURATION.clone())).unwrap();
    registry.register(Box::new(TRACKED_SHIPMENTS.clone())).unwrap();
    registry.register(Box::new(PORTAL_IMPORTS.clone())).unwrap();
    registry.register(Box::new(SHIPMENTS_DISCOVERED.clone())).unwrap();
    registry.register(Box::new(TICKETS_SKIPPED.clone())).unwrap();
}

/// Encode all registered metrics in the Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

//! Carrier status fetching.
//!
//! This module provides a `CarrierClient` trait with one scraping
//! implementation per carrier, a registry keyed by [`Carrier`], and the
//! single-flight [`RequestGate`] every outbound carrier request passes through.
//!
//! [`Carrier`]: crate::shipment::Carrier

mod gate;
mod registry;
mod types;
mod ups;

pub use gate::RequestGate;
pub use registry::CarrierRegistry;
pub use types::{CarrierClient, CarrierError};
pub use ups::{extract_estimated_delivery, strip_tags, UpsCarrier, UPS_DELIVERED_PHRASE};

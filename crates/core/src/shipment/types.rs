//! Shipment data model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder stored while the carrier has not published an estimate.
pub const UNKNOWN_ESTIMATE: &str = "unknown";

/// Carrier whose public tracking page decides a shipment's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Carrier {
    #[serde(rename = "UPS", alias = "ups", alias = "Ups")]
    Ups,
}

impl Carrier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Carrier::Ups => "UPS",
        }
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery status of a shipment.
///
/// Only moves forward: once `Delivered`, a record never returns to `Pending`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShipmentStatus {
    #[default]
    Pending,
    Delivered,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "Pending",
            ShipmentStatus::Delivered => "Delivered",
        }
    }
}

/// A tracked shipment.
///
/// Field names on disk are camelCase and must stay stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentRecord {
    pub carrier: Carrier,
    /// Unique key, never changes after creation.
    pub tracking_number: String,
    /// Requester that reported the shipment (ticket discovery only).
    #[serde(default)]
    pub store_id: String,
    /// Helpdesk ticket the shipment was found in (ticket discovery only).
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub status: ShipmentStatus,
    /// Carrier-supplied free text, or [`UNKNOWN_ESTIMATE`].
    #[serde(default = "unknown_estimate")]
    pub estimated_delivery: String,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

fn unknown_estimate() -> String {
    UNKNOWN_ESTIMATE.to_string()
}

impl ShipmentRecord {
    /// Create a pending record with no estimate.
    pub fn new(carrier: Carrier, tracking_number: impl Into<String>) -> Self {
        Self {
            carrier,
            tracking_number: tracking_number.into(),
            store_id: String::new(),
            request_id: String::new(),
            status: ShipmentStatus::Pending,
            estimated_delivery: unknown_estimate(),
            last_updated: Utc::now(),
        }
    }

    /// Attach ticket provenance.
    pub fn with_provenance(
        mut self,
        store_id: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        self.store_id = store_id.into();
        self.request_id = request_id.into();
        self
    }

    pub fn is_delivered(&self) -> bool {
        self.status == ShipmentStatus::Delivered
    }

    pub fn has_estimate(&self) -> bool {
        self.estimated_delivery != UNKNOWN_ESTIMATE
    }

    /// Merge a status check into the record.
    ///
    /// Delivery is sticky, a missing estimate keeps the previous one, and
    /// `last_updated` never moves backwards.
    pub fn apply_snapshot(&mut self, snapshot: &StatusSnapshot, checked_at: DateTime<Utc>) {
        if snapshot.delivered {
            self.status = ShipmentStatus::Delivered;
        }
        if let Some(estimate) = snapshot.estimated_delivery.as_deref() {
            if !estimate.is_empty() && estimate != UNKNOWN_ESTIMATE {
                self.estimated_delivery = estimate.to_string();
            }
        }
        if checked_at > self.last_updated {
            self.last_updated = checked_at;
        }
    }
}

/// Result of one carrier status check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// The carrier page carried its delivery confirmation.
    pub delivered: bool,
    /// Estimated delivery text, `None` when the page did not publish one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<String>,
}

impl StatusSnapshot {
    /// Snapshot that changes nothing except the check time.
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn delivered() -> Self {
        Self {
            delivered: true,
            estimated_delivery: None,
        }
    }

    pub fn with_estimate(mut self, estimate: impl Into<String>) -> Self {
        self.estimated_delivery = Some(estimate.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_record_defaults() {
        let record = ShipmentRecord::new(Carrier::Ups, "1Z0625ABCDEF123456");
        assert_eq!(record.status, ShipmentStatus::Pending);
        assert_eq!(record.estimated_delivery, UNKNOWN_ESTIMATE);
        assert!(record.store_id.is_empty());
        assert!(record.request_id.is_empty());
        assert!(!record.has_estimate());
    }

    #[test]
    fn test_serialized_field_names() {
        let record = ShipmentRecord::new(Carrier::Ups, "1Z0625ABCDEF123456")
            .with_provenance("M1042", "48213");
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["carrier"], "UPS");
        assert_eq!(value["trackingNumber"], "1Z0625ABCDEF123456");
        assert_eq!(value["storeId"], "M1042");
        assert_eq!(value["requestId"], "48213");
        assert_eq!(value["status"], "Pending");
        assert_eq!(value["estimatedDelivery"], "unknown");
        assert!(value["lastUpdated"].is_string());
    }

    #[test]
    fn test_deserialize_minimal_record() {
        let json = r#"{"carrier": "UPS", "trackingNumber": "1Z0625ABCDEF123456"}"#;
        let record: ShipmentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.carrier, Carrier::Ups);
        assert_eq!(record.status, ShipmentStatus::Pending);
        assert_eq!(record.estimated_delivery, UNKNOWN_ESTIMATE);
    }

    #[test]
    fn test_carrier_accepts_lowercase_alias() {
        let carrier: Carrier = serde_json::from_str("\"ups\"").unwrap();
        assert_eq!(carrier, Carrier::Ups);
        assert_eq!(serde_json::to_string(&carrier).unwrap(), "\"UPS\"");
    }

    #[test]
    fn test_apply_snapshot_marks_delivered() {
        let mut record = ShipmentRecord::new(Carrier::Ups, "1Z0625ABCDEF123456");
        record.apply_snapshot(&StatusSnapshot::delivered(), Utc::now());
        assert!(record.is_delivered());
        assert_eq!(record.estimated_delivery, UNKNOWN_ESTIMATE);
    }

    #[test]
    fn test_apply_snapshot_never_regresses() {
        let mut record = ShipmentRecord::new(Carrier::Ups, "1Z0625ABCDEF123456");
        record.apply_snapshot(&StatusSnapshot::delivered(), Utc::now());
        record.apply_snapshot(&StatusSnapshot::unchanged(), Utc::now());
        assert_eq!(record.status, ShipmentStatus::Delivered);
    }

    #[test]
    fn test_apply_snapshot_keeps_estimate_when_absent() {
        let mut record = ShipmentRecord::new(Carrier::Ups, "1Z0625ABCDEF123456");
        record.apply_snapshot(
            &StatusSnapshot::unchanged().with_estimate("12.05.2025 Pazartesi"),
            Utc::now(),
        );
        assert_eq!(record.estimated_delivery, "12.05.2025 Pazartesi");

        record.apply_snapshot(&StatusSnapshot::unchanged(), Utc::now());
        assert_eq!(record.estimated_delivery, "12.05.2025 Pazartesi");

        record.apply_snapshot(
            &StatusSnapshot::unchanged().with_estimate(UNKNOWN_ESTIMATE),
            Utc::now(),
        );
        assert_eq!(record.estimated_delivery, "12.05.2025 Pazartesi");
    }

    #[test]
    fn test_apply_snapshot_last_updated_monotonic() {
        let mut record = ShipmentRecord::new(Carrier::Ups, "1Z0625ABCDEF123456");
        let later = record.last_updated + Duration::minutes(10);
        record.apply_snapshot(&StatusSnapshot::unchanged(), later);
        assert_eq!(record.last_updated, later);

        let earlier = later - Duration::minutes(5);
        record.apply_snapshot(&StatusSnapshot::unchanged(), earlier);
        assert_eq!(record.last_updated, later);
    }
}

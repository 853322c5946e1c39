//! Shipment API tests over the in-process router.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use common::{fixtures, TestConfig, TestFixture};
use parcelwatch_core::{ShipmentStore, StatusSnapshot};

const TN: &str = "1Z0625ABCDEF123456";

fn new_shipment(tracking_number: &str) -> serde_json::Value {
    json!({
        "carrier": "UPS",
        "trackingNumber": tracking_number,
    })
}

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/health").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_hides_portal_password() {
    let fixture = TestFixture::with_config(TestConfig {
        default_credentials: Some(("bot@example.com".into(), "hunter2".into())),
        ..Default::default()
    })
    .await;

    let response = fixture.get("/api/config").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["portal"]["email"], "bot@example.com");
    assert_eq!(response.body["portal"]["password_configured"], true);
    assert!(!response.body.to_string().contains("hunter2"));
}

#[tokio::test]
async fn test_add_list_get_delete() {
    let fixture = TestFixture::new().await;

    let response = fixture.post("/api/shipments", new_shipment(TN)).await;
    assert_status!(response, StatusCode::CREATED);
    assert_eq!(response.body["trackingNumber"], TN);
    assert_eq!(response.body["carrier"], "UPS");
    assert_eq!(response.body["status"], "Pending");
    assert_eq!(response.body["estimatedDelivery"], "unknown");
    assert_eq!(response.body["storeId"], "");

    let response = fixture.get("/api/shipments").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body.as_array().unwrap().len(), 1);

    let response = fixture.get(&format!("/api/shipments/{}", TN)).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["trackingNumber"], TN);

    let response = fixture.delete(&format!("/api/shipments/{}", TN)).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["deleted"], true);

    let response = fixture.get(&format!("/api/shipments/{}", TN)).await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_add_conflicts() {
    let fixture = TestFixture::new().await;

    fixture.post("/api/shipments", new_shipment(TN)).await;
    let response = fixture.post("/api/shipments", new_shipment(TN)).await;

    assert_status!(response, StatusCode::CONFLICT);
    assert!(response.body["error"].as_str().unwrap().contains(TN));
    assert_eq!(fixture.store.list().unwrap().len(), 1);
}

#[tokio::test]
async fn test_blank_tracking_number_rejected() {
    let fixture = TestFixture::new().await;
    let response = fixture.post("/api/shipments", new_shipment("  ")).await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_unknown_is_noop() {
    let fixture = TestFixture::new().await;
    let response = fixture.delete(&format!("/api/shipments/{}", TN)).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["deleted"], false);
}

#[tokio::test]
async fn test_check_shipment() {
    let fixture = TestFixture::new().await;
    fixture.store.insert(fixtures::ups_record(TN)).unwrap();
    fixture
        .carrier
        .set_snapshot(TN, StatusSnapshot::delivered().with_estimate("15.03.2026"))
        .await;

    let response = fixture
        .post_empty(&format!("/api/shipments/{}/check", TN))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "Delivered");
    assert_eq!(response.body["estimatedDelivery"], "15.03.2026");
}

#[tokio::test]
async fn test_check_unknown_shipment() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post_empty(&format!("/api/shipments/{}/check", TN))
        .await;

    assert_status!(response, StatusCode::NOT_FOUND);
    assert_eq!(fixture.carrier.fetch_count().await, 0);
}

#[tokio::test]
async fn test_check_carrier_failure_is_bad_gateway() {
    let fixture = TestFixture::new().await;
    fixture.store.insert(fixtures::ups_record(TN)).unwrap();
    fixture.carrier.fail_for(TN).await;

    let response = fixture
        .post_empty(&format!("/api/shipments/{}/check", TN))
        .await;

    assert_status!(response, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_add_triggers_initial_check() {
    let fixture = TestFixture::with_config(TestConfig {
        check_on_add: true,
        ..Default::default()
    })
    .await;
    fixture
        .carrier
        .set_snapshot(TN, StatusSnapshot::delivered())
        .await;

    let response = fixture.post("/api/shipments", new_shipment(TN)).await;
    assert_status!(response, StatusCode::CREATED);

    for _ in 0..50 {
        if fixture.coordinator.get(TN).unwrap().is_delivered() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(fixture.coordinator.get(TN).unwrap().is_delivered());
    assert_eq!(fixture.carrier.fetch_count().await, 1);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.store.insert(fixtures::ups_record(TN)).unwrap();
    fixture.coordinator.sync_all().await.unwrap();

    let (status, body) = fixture.get_text("/api/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("parcelwatch_sync_runs_total"));
}

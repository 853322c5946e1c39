//! Ticket portal import API tests.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{fixtures, TestConfig, TestFixture};
use parcelwatch_core::ShipmentStore;

const TN: &str = "1Z0625ABCDEF123456";

fn credentials() -> serde_json::Value {
    json!({ "email": "ops@example.com", "password": "secret" })
}

#[tokio::test]
async fn test_import_returns_added_records() {
    let fixture = TestFixture::new().await;
    fixture
        .portal
        .add_ticket(
            "48213",
            "M1042 Kadikoy",
            "#Kargo",
            "ServiceDesk",
            &fixtures::ticket_body(&["Takip no:", TN]),
        )
        .await;

    let response = fixture.post("/api/import", credentials()).await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["addedCount"], 1);
    assert_eq!(response.body["records"][0]["trackingNumber"], TN);
    assert_eq!(response.body["records"][0]["storeId"], "M1042");
    assert_eq!(response.body["records"][0]["requestId"], "48213");
    assert!(fixture.store.contains(TN).unwrap());
}

#[tokio::test]
async fn test_import_authentication_failure() {
    let fixture = TestFixture::new().await;
    fixture.portal.fail_authentication("bad password").await;

    let response = fixture.post("/api/import", credentials()).await;

    assert_status!(response, StatusCode::UNAUTHORIZED);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("bad password"));
}

#[tokio::test]
async fn test_import_without_credentials() {
    let fixture = TestFixture::new().await;

    let response = fixture.post("/api/import", json!({})).await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(fixture.portal.launch_count().await, 0);
}

#[tokio::test]
async fn test_import_with_configured_credentials() {
    let fixture = TestFixture::with_config(TestConfig {
        default_credentials: Some(("bot@example.com".into(), "pw".into())),
        ..Default::default()
    })
    .await;

    let response = fixture.post("/api/import", json!({})).await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["addedCount"], 0);
    assert_eq!(fixture.portal.logins().await, vec!["bot@example.com"]);
}

#[tokio::test]
async fn test_import_not_configured() {
    let fixture = TestFixture::with_config(TestConfig {
        enable_portal: false,
        ..Default::default()
    })
    .await;

    let response = fixture.post("/api/import", credentials()).await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("not configured"));
}

#[tokio::test]
async fn test_import_launch_failure() {
    let fixture = TestFixture::new().await;
    fixture.portal.fail_launch("chrome missing").await;

    let response = fixture.post("/api/import", credentials()).await;

    assert_status!(response, StatusCode::INTERNAL_SERVER_ERROR);
}

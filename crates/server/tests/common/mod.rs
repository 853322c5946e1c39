//! Common test utilities for in-process API testing with mocks.
//!
//! The fixture builds the real router over an in-memory record store, a
//! mocked carrier and a scripted helpdesk portal, so requests run end to end
//! without network access or a browser.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use parcelwatch_core::{
    testing::{MockCarrier, MockPortalLauncher, MockShipmentStore},
    load_config_from_str, CarrierRegistry, Config, DiscoveryImporter, DiscoverySettings,
    PortalConfig, RequestGate, ServerConfig, SyncConfig, SyncCoordinator,
};

/// Re-export fixtures for test convenience
pub use parcelwatch_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_add_shipment() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/shipments", json!({
///         "carrier": "UPS",
///         "trackingNumber": "1Z0625ABCDEF123456"
///     })).await;
///
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock carrier - script status pages
    pub carrier: Arc<MockCarrier>,
    /// Mock portal - script inbox rows and ticket bodies
    pub portal: Arc<MockPortalLauncher>,
    /// In-memory record store
    pub store: Arc<MockShipmentStore>,
    pub coordinator: Arc<SyncCoordinator>,
    /// Scratch directory used as the static UI root
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Wire a portal importer into the app state
    pub enable_portal: bool,
    /// Check new shipments right after adding them
    pub check_on_add: bool,
    /// Default portal credentials in the config
    pub default_credentials: Option<(String, String)>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            enable_portal: true,
            check_on_add: false,
            default_credentials: None,
        }
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let carrier = Arc::new(MockCarrier::new());
        let portal = Arc::new(MockPortalLauncher::new());
        let store = Arc::new(MockShipmentStore::new());

        let portal_config = test_config.enable_portal.then(|| {
            let mut portal_config: PortalConfig =
                load_config_from_str("[portal]\nurl = \"https://helpdesk.example.com\"")
                    .expect("Failed to build portal config")
                    .portal
                    .expect("Portal section missing");
            if let Some((email, password)) = &test_config.default_credentials {
                portal_config.email = Some(email.clone());
                portal_config.password = Some(password.clone());
            }
            portal_config
        });

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
                static_dir: temp_dir.path().to_path_buf(),
            },
            sync: SyncConfig {
                enabled: false,
                check_on_add: test_config.check_on_add,
                ..Default::default()
            },
            portal: portal_config.clone(),
            ..Default::default()
        };

        let coordinator = Arc::new(SyncCoordinator::new(
            Arc::clone(&store) as Arc<dyn parcelwatch_core::ShipmentStore>,
            CarrierRegistry::new().with_client(Arc::clone(&carrier) as _),
            Arc::new(RequestGate::new(std::time::Duration::ZERO)),
        ));

        let importer = portal_config.map(|portal_config| {
            let mut importer = DiscoveryImporter::new(
                Arc::clone(&portal) as _,
                Arc::clone(&coordinator),
                DiscoverySettings::from(&portal_config),
            );
            if let (Some(email), Some(password)) = (&portal_config.email, &portal_config.password)
            {
                importer = importer.with_default_credentials(
                    parcelwatch_core::PortalCredentials::new(email.as_str(), password.as_str()),
                );
            }
            Arc::new(importer)
        });

        let state = Arc::new(parcelwatch_server::state::AppState::new(
            config,
            Arc::clone(&coordinator),
            importer,
        ));

        let router = parcelwatch_server::api::create_router(state);

        Self {
            router,
            carrier,
            portal,
            store,
            coordinator,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&body_bytes).into_owned())
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert response status with a helpful message.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that builds the router in-process
//! with a mock provider factory behind the orchestrator, so the HTTP surface
//! can be exercised without any cloud provider.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use gamekit_deploy_core::testing::MockProviderFactory;
use gamekit_deploy_core::{Config, DeploymentOrchestrator, FeatureType, ServerConfig};
use gamekit_deploy_server::state::AppState;

/// Re-export fixtures for test convenience
pub use gamekit_deploy_core::testing::fixtures;

/// Test fixture for API testing with mock collaborators.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_create_identity() {
///     let fixture = TestFixture::with_account().await;
///     let response = fixture.post("/api/v1/features/identity/create", json!({})).await;
///     assert_eq!(response.status, StatusCode::OK);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock factory - script per-feature stack statuses and failures
    pub factory: Arc<MockProviderFactory>,
    /// The orchestrator behind the router
    pub orchestrator: Arc<DeploymentOrchestrator>,
    api_key: Option<String>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Fixture without credentials and without an API key.
    pub async fn new() -> Self {
        Self::with_api_key(None)
    }

    /// Fixture whose `/api/v1` routes require `api_key`.
    pub fn with_api_key(api_key: Option<&str>) -> Self {
        let factory = Arc::new(MockProviderFactory::new());
        let orchestrator = Arc::new(DeploymentOrchestrator::new(factory.clone()));

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 8080,
                api_key: api_key.map(str::to_string),
            },
            ..Config::default()
        };

        let state = Arc::new(AppState::new(config, Arc::clone(&orchestrator)));
        let router = gamekit_deploy_server::api::create_router(state);

        Self {
            router,
            factory,
            orchestrator,
            api_key: api_key.map(str::to_string),
        }
    }

    /// Fixture with the test account applied through the API.
    pub async fn with_account() -> Self {
        let fixture = Self::new().await;
        let response = fixture.put("/api/v1/credentials", account_body()).await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        fixture
    }

    /// Script raw stack statuses on the mocks, then refresh through the API.
    pub async fn seed(&self, statuses: &[(FeatureType, &str)]) {
        self.factory.set_stack_statuses(statuses);
        let response = self.post("/api/v1/features/refresh", Value::Null).await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a GET request without the fixture's API key.
    pub async fn get_without_key(&self, path: &str) -> TestResponse {
        self.send("GET", path, None, false).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        self.send(method, path, body, true).await
    }

    async fn send(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        with_key: bool,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        if let Some(key) = self.api_key.as_ref().filter(|_| with_key) {
            request_builder = request_builder.header("X-API-Key", key.as_str());
        }

        let body = match body {
            Some(json_body) if !json_body.is_null() => {
                request_builder = request_builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_vec(&json_body).unwrap())
            }
            _ => Body::empty(),
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
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into()))
        };

        TestResponse { status, body }
    }
}

/// `PUT /credentials` body for the fixture account.
pub fn account_body() -> Value {
    let info = fixtures::account_info();
    let credentials = fixtures::credentials();
    json!({
        "environment": info.environment,
        "account_id": info.account_id,
        "company_name": info.company_name,
        "game_name": info.game_name,
        "region": credentials.region,
        "access_key": credentials.access_key,
        "access_secret": credentials.access_secret,
    })
}

/// Reported status string of `feature` in a response's `statuses` or `features` list.
pub fn status_of(body: &Value, feature: &str) -> Option<String> {
    body.get("statuses")
        .or_else(|| body.get("features"))?
        .as_array()?
        .iter()
        .find(|s| s["feature"] == feature)
        .and_then(|s| s["status"].as_str())
        .map(str::to_string)
}

/// Helper to assert a response has expected status.
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

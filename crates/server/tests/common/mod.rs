//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! with mock providers and a mock stock catalog injected, so the control
//! API can be exercised without network access.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use mirage_core::{
    config::{DatabaseConfig, LibraryConfig, ProvidersConfig, ServerConfig},
    testing::{MockImageProvider, MockStockCatalog},
    AcquisitionConfig, AcquisitionQueue, AutopilotConfig, AutopilotScheduler, CheckpointStore,
    Config, ImageProvider, LibraryIndex, ParallelDispatcher, ProviderKind, RegistryStore,
    RetryConfig, RetryingInvoker, SqliteCheckpointStore, SqliteLibrary, StockCatalog,
    TopicCatalog,
};
use mirage_server::state::AppState;

/// Re-export fixtures for test convenience
pub use mirage_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() {
///     let fixture = TestFixture::new().await;
///     let response = fixture.get("/api/v1/health").await;
///     assert_eq!(response.status, StatusCode::OK);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock Gemini provider
    pub gemini: Arc<MockImageProvider>,
    /// Mock OpenAI provider
    pub openai: Arc<MockImageProvider>,
    /// Mock stock catalog - configure pages and failures
    pub catalog: Arc<MockStockCatalog>,
    /// Temporary directory for the test database and library files
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
    /// Wire the autopilot to mock providers
    pub enable_autopilot: bool,
    /// Wire bulk acquisition to the mock catalog
    pub enable_acquisition: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            enable_autopilot: true,
            enable_acquisition: true,
        }
    }
}

impl TestConfig {
    /// Neither loop available.
    pub fn bare() -> Self {
        Self {
            enable_autopilot: false,
            enable_acquisition: false,
        }
    }
}

impl TestFixture {
    /// Create a new test fixture with both loops wired to mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let root = temp_dir.path().join("library");

        let gemini = Arc::new(MockImageProvider::new(ProviderKind::Gemini));
        let openai = Arc::new(MockImageProvider::new(ProviderKind::OpenAi));
        let catalog = Arc::new(MockStockCatalog::new());

        let providers = if test_config.enable_autopilot {
            ProvidersConfig {
                gemini: Some(
                    serde_json::from_value(json!({ "api_key": "test-secret" }))
                        .expect("Failed to build gemini config"),
                ),
                openai: None,
            }
        } else {
            ProvidersConfig::default()
        };

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            library: LibraryConfig { root: root.clone() },
            providers,
            stock: None,
            retry: RetryConfig {
                max_attempts: 1,
                ..Default::default()
            },
            autopilot: AutopilotConfig {
                target_per_topic: 2,
                parallelism: 2,
                round_delay_ms: 0,
                max_topics: 1,
                ..Default::default()
            },
            acquisition: AcquisitionConfig {
                max_pages: 3,
                item_delay_ms: 0,
                ..Default::default()
            },
        };

        // Create stores
        let library: Arc<dyn LibraryIndex> = Arc::new(
            SqliteLibrary::new(&db_path, &root).expect("Failed to create library"),
        );
        let checkpoints: Arc<dyn CheckpointStore> = Arc::new(
            SqliteCheckpointStore::new(&db_path).expect("Failed to create checkpoint store"),
        );
        let registry = Arc::new(RegistryStore::new(Arc::clone(&checkpoints)));
        let topics = Arc::new(TopicCatalog::new(Arc::clone(&checkpoints)));

        let autopilot = test_config.enable_autopilot.then(|| {
            let dispatcher = Arc::new(ParallelDispatcher::new(
                vec![
                    Arc::clone(&gemini) as Arc<dyn ImageProvider>,
                    Arc::clone(&openai) as Arc<dyn ImageProvider>,
                ],
                RetryingInvoker::new(config.retry.clone()),
                config.autopilot.parallelism,
            ));
            Arc::new(AutopilotScheduler::new(
                config.autopilot.clone(),
                dispatcher,
                Arc::clone(&library),
                Arc::clone(&checkpoints),
                Arc::clone(&topics),
            ))
        });

        let acquisition = test_config.enable_acquisition.then(|| {
            Arc::new(AcquisitionQueue::new(
                config.acquisition.clone(),
                Arc::clone(&catalog) as Arc<dyn StockCatalog>,
                Arc::clone(&library),
                Arc::clone(&checkpoints),
                Arc::clone(&registry),
                Arc::clone(&topics),
            ))
        });

        let state = Arc::new(AppState::new(
            config,
            library,
            checkpoints,
            registry,
            topics,
            autopilot,
            acquisition,
        ));

        let router = mirage_server::api::create_router(state);

        Self {
            router,
            gemini,
            openai,
            catalog,
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

    /// Send a GET request and return the raw body as text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let (status, bytes) = self.send(request).await;
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    /// Poll a status endpoint until its `running` flag clears.
    pub async fn wait_until_idle(&self, status_path: &str, pointer: &str) {
        for _ in 0..500 {
            let response = self.get(status_path).await;
            if response.body.pointer(pointer) == Some(&Value::Bool(false)) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{} still running", status_path);
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        let (status, body_bytes) = self.send(request).await;

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
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

        (status, body_bytes.to_vec())
    }
}

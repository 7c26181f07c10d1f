//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock encoder injected, so video conversions run without ffmpeg.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use mediaconv_core::{
    testing::MockEncoderRunner, Config, ConverterConfig, EncoderRunner, MediaConverter,
    ServerConfig, UploadLimits,
};
use mediaconv_server::state::AppState;

/// Re-export fixtures for test convenience
pub use mediaconv_core::testing::fixtures;

/// Boundary used for every multipart body built here.
const BOUNDARY: &str = "mediaconv-test-boundary";

/// Test fixture for E2E testing with a mock encoder.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_convert() {
///     let fixture = TestFixture::new().await;
///
///     let form = MultipartForm::new()
///         .text("kind", "image")
///         .text("format", "jpeg")
///         .file("file", "photo.png", fixtures::png_bytes(8, 8));
///     let response = fixture.post_multipart("/api/v1/convert", form).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock encoder - inspect invocations, simulate failures
    pub runner: Arc<MockEncoderRunner>,
    /// Temporary root holding the scratch and output directories
    pub temp_dir: TempDir,
    /// Where converted files are written
    pub output_dir: PathBuf,
}

/// Knobs for building a fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    pub limits: UploadLimits,
}

/// Response from a JSON test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Response with raw body and headers
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    /// Parse the body as JSON, `Value::Null` when it is not JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestFixture {
    /// Create a new test fixture with default limits.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let output_dir = temp_dir.path().join("output");

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            limits: test_config.limits,
            converter: ConverterConfig::default()
                .with_temp_dir(temp_dir.path().join("scratch"))
                .with_output_dir(output_dir.clone()),
        };

        let runner = Arc::new(MockEncoderRunner::new());
        let converter = MediaConverter::new(
            &config,
            Arc::clone(&runner) as Arc<dyn EncoderRunner>,
        );

        let state = Arc::new(AppState::new(config, Arc::new(converter)));
        let router = mediaconv_server::api::create_router(state);

        Self {
            router,
            runner,
            temp_dir,
            output_dir,
        }
    }

    /// Send a GET request and parse the body as JSON.
    pub async fn get(&self, path: &str) -> TestResponse {
        let raw = self.get_raw(path).await;
        TestResponse {
            status: raw.status,
            body: raw.json(),
        }
    }

    /// Send a GET request and keep the body as bytes.
    pub async fn get_raw(&self, path: &str) -> RawResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a multipart POST request.
    pub async fn post_multipart(&self, path: &str, form: MultipartForm) -> RawResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(form.into_body()))
            .unwrap();
        self.send(request).await
    }

    /// Files currently sitting in the output directory.
    pub fn output_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(&self.output_dir) {
            Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    async fn send(&self, request: Request<Body>) -> RawResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        RawResponse {
            status,
            headers,
            body,
        }
    }
}

/// Builder for `multipart/form-data` request bodies.
#[derive(Debug, Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field.
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body
            .extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        self.body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Add a file field.
    pub fn file(mut self, name: &str, file_name: &str, data: Vec<u8>) -> Self {
        self.body
            .extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, file_name
            )
            .as_bytes(),
        );
        self.body
            .extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        self.body.extend_from_slice(&data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn into_body(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }
}

/// Form for converting `data` named `file_name` to `format`.
pub fn convert_form(kind: &str, format: &str, file_name: &str, data: Vec<u8>) -> MultipartForm {
    MultipartForm::new()
        .text("kind", kind)
        .text("format", format)
        .file("file", file_name, data)
}

//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which builds a full [`AppContext`] with its
//! artifact directory inside a temp dir. The [`TestHarness::with_server`]
//! constructor starts Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;
use mediahub::config::Config;
use mediahub::server::{create_router, AppContext};
use mediahub::state::Job;
use tempfile::TempDir;

/// Token accepted by a harness built from the default config.
pub const TOKEN: &str = "token";

pub struct TestHarness {
    pub ctx: AppContext,
    pub dir: TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration. The artifact
    /// directory is always redirected into the harness temp dir.
    pub fn with_config(mut config: Config) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        config.server.artifact_dir = dir.path().join("artifacts");
        let ctx = AppContext::new(config, None);
        Self { ctx, dir }
    }

    pub fn router(&self) -> Router {
        create_router(self.ctx.clone())
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let addr = serve(harness.router()).await;
        (harness, addr)
    }

    /// Queue a job directly on the table.
    pub fn submit(&self, path: &str) -> Job {
        self.ctx.queue.submit(PathBuf::from(path))
    }

    pub fn artifact_dir(&self) -> PathBuf {
        self.dir.path().join("artifacts")
    }
}

/// Serve `app` on a random local port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind random port");
    let addr = listener.local_addr().expect("failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    addr
}

/// Client that sends the harness token on every request.
pub fn authed_client() -> reqwest::Client {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        "x-auth",
        reqwest::header::HeaderValue::from_static(TOKEN),
    );
    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .expect("failed to build client")
}

/// Multipart body carrying `data` in the `sprite` field.
pub fn sprite_form(file_name: &str, data: &[u8]) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(data.to_vec())
        .file_name(file_name.to_string())
        .mime_str("image/jpeg")
        .expect("valid mime");
    reqwest::multipart::Form::new().part("sprite", part)
}

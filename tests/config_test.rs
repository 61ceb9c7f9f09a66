//! Settings persistence through `/admin/config`.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{TestHarness, TOKEN};
use http_body_util::BodyExt;
use mediahub::config::{self, Config};
use mediahub::server::{create_router, AppContext};
use serde_json::{json, Value};
use tower::ServiceExt;

const CONFIG_FILE: &str = r#"# mediahub dispatcher
[server]
port = 9100 # keep this comment

[settings]
download_dir = "/srv/downloads"
ffmpeg_preset = "fast"
"#;

fn put_settings(body: Value) -> Request<Body> {
    Request::put("/admin/config")
        .header("X-Auth", TOKEN)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_settings() -> Request<Body> {
    Request::get("/admin/config")
        .header("X-Auth", TOKEN)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn put_writes_settings_back_to_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mediahub.toml");
    std::fs::write(&path, CONFIG_FILE).unwrap();

    let mut config = config::load_config(&path).unwrap();
    config.server.artifact_dir = dir.path().join("artifacts");
    assert_eq!(config.settings.download_dir, "/srv/downloads");

    let ctx = AppContext::new(config, Some(path.clone()));
    let app = create_router(ctx);

    let response = app
        .clone()
        .oneshot(put_settings(json!({
            "download_dir": "/mnt/media",
            "ffmpeg_preset": "slow"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response.into_body()).await["ffmpeg_preset"], "slow");

    let response = app.oneshot(get_settings()).await.unwrap();
    assert_eq!(
        body_json(response.into_body()).await,
        json!({"download_dir": "/mnt/media", "ffmpeg_preset": "slow"})
    );

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("# keep this comment"));
    let reloaded = config::load_config(&path).unwrap();
    assert_eq!(reloaded.server.port, 9100);
    assert_eq!(reloaded.settings.download_dir, "/mnt/media");
    assert_eq!(reloaded.settings.ffmpeg_preset, "slow");
}

#[tokio::test]
async fn settings_path_overrides_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let settings_path = dir.path().join("settings.toml");

    let mut config = Config::default();
    config.server.settings_path = Some(settings_path.clone());
    let harness = TestHarness::with_config(config);

    let response = harness
        .router()
        .oneshot(put_settings(json!({
            "download_dir": "/data",
            "ffmpeg_preset": "veryfast"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let written = std::fs::read_to_string(&settings_path).unwrap();
    assert!(written.contains("[settings]"));
    assert!(written.contains("veryfast"));
}

#[tokio::test]
async fn failed_write_keeps_previous_settings() {
    let dir = tempfile::tempdir().unwrap();

    // A directory cannot be written as a file.
    let mut config = Config::default();
    config.server.settings_path = Some(dir.path().to_path_buf());
    let harness = TestHarness::with_config(config);
    let app = harness.router();

    let response = app
        .clone()
        .oneshot(put_settings(json!({
            "download_dir": "/data",
            "ffmpeg_preset": "slow"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response.into_body()).await["code"], "internal_error");

    let response = app.oneshot(get_settings()).await.unwrap();
    assert_eq!(
        body_json(response.into_body()).await,
        json!({"download_dir": "/downloads", "ffmpeg_preset": "fast"})
    );
}

#[tokio::test]
async fn memory_only_store_accepts_updates() {
    let harness = TestHarness::new();

    let response = harness
        .router()
        .oneshot(put_settings(json!({
            "download_dir": "/tmp/dl",
            "ffmpeg_preset": "medium"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(harness.ctx.settings.load().download_dir, "/tmp/dl");
}

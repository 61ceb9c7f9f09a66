//! CLI end-to-end tests
//!
//! Tests for the mediahub command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the mediahub binary
#[allow(deprecated)]
fn mediahub_cmd() -> Command {
    let mut cmd = Command::cargo_bin("mediahub").unwrap();
    cmd.env_remove("API_URL")
        .env_remove("API_TOKEN")
        .env_remove("POLL_INTERVAL_SECS");
    cmd
}

#[test]
fn test_cli_no_args_shows_help() {
    mediahub_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_lists_commands() {
    mediahub_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("worker"))
        .stdout(predicate::str::contains("enqueue"));
}

#[test]
fn test_cli_worker_help_mentions_env() {
    mediahub_cmd()
        .args(["worker", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("API_URL"))
        .stdout(predicate::str::contains("POLL_INTERVAL_SECS"));
}

#[test]
fn test_cli_version_command() {
    mediahub_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "mediahub {}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_cli_openapi_writes_both_formats() {
    let dir = tempdir().unwrap();

    mediahub_cmd()
        .args(["openapi", "--out-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("openapi.json"))
        .stdout(predicate::str::contains("openapi.yaml"));

    let json = fs::read_to_string(dir.path().join("openapi.json")).unwrap();
    assert!(json.contains("\"/jobs/{id}/done\""));
    assert!(dir.path().join("openapi.yaml").is_file());
}

#[test]
fn test_cli_check_tools_command() {
    mediahub_cmd()
        .arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg"));
}

#[test]
fn test_cli_validate_valid_config() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("mediahub.toml");
    fs::write(
        &config_path,
        r#"
[server]
port = 9000

[dispatcher]
lease_secs = 600
max_attempts = 5

[[catalog]]
id = "bbb"
title = "Big Buck Bunny"
"#,
    )
    .unwrap();

    mediahub_cmd()
        .arg("validate")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("0.0.0.0:9000"))
        .stdout(predicate::str::contains("max attempts 5"))
        .stdout(predicate::str::contains("Catalog entries: 1"));
}

#[test]
fn test_cli_validate_global_config_flag() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("mediahub.toml");
    fs::write(&config_path, "[worker]\npoll_interval_secs = 2\n").unwrap();

    mediahub_cmd()
        .arg("--config")
        .arg(&config_path)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("poll every 2s"));
}

#[test]
fn test_cli_validate_rejects_zero_lease() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("mediahub.toml");
    fs::write(&config_path, "[dispatcher]\nlease_secs = 0\n").unwrap();

    mediahub_cmd()
        .arg("validate")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("lease_secs"));
}

#[test]
fn test_cli_validate_missing_file() {
    mediahub_cmd()
        .args(["validate", "/nonexistent/mediahub.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn test_cli_sprite_missing_input_fails() {
    let dir = tempdir().unwrap();

    mediahub_cmd()
        .current_dir(dir.path())
        .args(["sprite", "missing.mp4"])
        .assert()
        .failure();
}

#[test]
fn test_cli_worker_rejects_bad_api_url() {
    let dir = tempdir().unwrap();

    mediahub_cmd()
        .current_dir(dir.path())
        .env("API_URL", "localhost:8000")
        .arg("worker")
        .assert()
        .failure()
        .stderr(predicate::str::contains("api_url"));
}

#[test]
fn test_cli_enqueue_unreachable_dispatcher_fails() {
    let dir = tempdir().unwrap();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    mediahub_cmd()
        .current_dir(dir.path())
        .env("API_URL", format!("http://{addr}"))
        .args(["enqueue", "/media/a.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to queue"));
}

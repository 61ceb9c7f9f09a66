pub mod persist;
mod types;

pub use persist::SettingsStore;
pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Upper bound for a job lease (one week).
const MAX_LEASE_SECS: u64 = 7 * 24 * 3600;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./mediahub.toml",
        "~/.config/mediahub/config.toml",
        "/etc/mediahub/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.server.auth_token.is_empty() {
        anyhow::bail!("Server auth_token cannot be empty");
    }

    if config.dispatcher.lease_secs == 0 || config.dispatcher.lease_secs > MAX_LEASE_SECS {
        anyhow::bail!(
            "Dispatcher lease_secs must be between 1 and {}",
            MAX_LEASE_SECS
        );
    }

    if config.dispatcher.reap_interval_secs == 0 {
        anyhow::bail!("Dispatcher reap_interval_secs must be greater than 0");
    }

    if config.dispatcher.max_attempts == 0 {
        anyhow::bail!("Dispatcher max_attempts must be greater than 0");
    }

    validate_worker(&config.worker)?;

    for entry in &config.catalog {
        if entry.id.trim().is_empty() {
            anyhow::bail!("Catalog entry '{}' has an empty id", entry.title);
        }
    }

    Ok(())
}

/// Validate the worker section on its own; CLI overrides are checked again
/// after they are applied.
pub fn validate_worker(worker: &WorkerConfig) -> Result<()> {
    let api_url = worker.api_url.trim();
    if api_url.is_empty() {
        anyhow::bail!("Worker api_url cannot be empty");
    }

    if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
        anyhow::bail!("Worker api_url must start with http:// or https://: {}", api_url);
    }

    if worker.auth_token.is_empty() {
        anyhow::bail!("Worker auth_token cannot be empty");
    }

    if worker.poll_interval_secs == 0 {
        anyhow::bail!("Worker poll_interval_secs must be greater than 0");
    }

    if worker.request_timeout_secs == 0 {
        anyhow::bail!("Worker request_timeout_secs must be greater than 0");
    }

    Ok(())
}

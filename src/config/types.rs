use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub settings: AppSettings,

    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret every caller must send in the `X-Auth` header
    #[serde(default = "default_token")]
    pub auth_token: String,

    /// Directory where uploaded sprite sheets are stored
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// File that `PUT /admin/config` writes `[settings]` to; defaults to the
    /// loaded config file
    #[serde(default)]
    pub settings_path: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_token() -> String {
    "token".to_string()
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("./artifacts")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            auth_token: default_token(),
            artifact_dir: default_artifact_dir(),
            settings_path: None,
        }
    }
}

/// Job lease and reclaim policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatcherConfig {
    /// How long a dispatched job may stay in progress before it is reclaimed
    #[serde(default = "default_lease_secs")]
    pub lease_secs: u64,

    /// How often the reaper looks for expired leases
    #[serde(default = "default_reap_interval")]
    pub reap_interval_secs: u64,

    /// Dispatches allowed before an expired job is marked failed
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_lease_secs() -> u64 {
    30 * 60
}

fn default_reap_interval() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            lease_secs: default_lease_secs(),
            reap_interval_secs: default_reap_interval(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl DispatcherConfig {
    pub fn lease(&self) -> Duration {
        Duration::from_secs(self.lease_secs)
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerConfig {
    /// Base URL of the dispatcher
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_token")]
    pub auth_token: String,

    /// Pause after an empty queue or an unreachable dispatcher
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_poll_interval() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    5
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            auth_token: default_token(),
            poll_interval_secs: default_poll_interval(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl WorkerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,
}

/// Flat application settings editable through `/admin/config`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppSettings {
    #[serde(default = "default_download_dir")]
    pub download_dir: String,

    #[serde(default = "default_ffmpeg_preset")]
    pub ffmpeg_preset: String,
}

fn default_download_dir() -> String {
    "/downloads".to_string()
}

fn default_ffmpeg_preset() -> String {
    "fast".to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            ffmpeg_preset: default_ffmpeg_preset(),
        }
    }
}

/// A searchable catalog title.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
}

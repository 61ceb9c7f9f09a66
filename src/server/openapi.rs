//! OpenAPI document for the dispatcher API.
//!
//! Served at `/openapi.json` and written to disk by `mediahub openapi`.

use anyhow::{Context, Result};
use axum::{routing::get, Json, Router};
use std::path::{Path, PathBuf};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::auth::AUTH_HEADER;
use super::AppContext;

/// Name of the shared-token security scheme referenced by protected routes.
pub const TOKEN_SCHEME: &str = "token";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "mediahub API",
        description = "Media job dispatcher: queue videos, hand them to sprite workers, collect the sheets",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
    ),
    paths(
        super::routes_api::health,
        super::routes_api::search,
        super::routes_jobs::submit_job,
        super::routes_jobs::list_jobs,
        super::routes_jobs::next_job,
        super::routes_jobs::get_job,
        super::routes_jobs::complete_job,
        super::routes_jobs::get_artifact,
        super::routes_config::get_settings,
        super::routes_config::update_settings,
    ),
    components(
        schemas(
            super::routes_api::HealthResponse,
            super::routes_api::SearchResponse,
            super::routes_jobs::SubmitJobRequest,
            super::routes_jobs::SpriteUpload,
            JobSchema,
            JobStatusSchema,
            JobTicketSchema,
            QueueStatsSchema,
            SearchHitSchema,
            SettingsSchema,
            ErrorSchema,
        )
    ),
    modifiers(&TokenAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "search", description = "Catalog search"),
        (name = "jobs", description = "Sprite job dispatch"),
        (name = "config", description = "Admin settings"),
    )
)]
pub struct ApiDoc;

struct TokenAuth;

impl Modify for TokenAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            TOKEN_SCHEME,
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(AUTH_HEADER))),
        );
    }
}

// Schema wrappers for state and config types, which stay free of utoipa.

/// A sprite job.
#[derive(utoipa::ToSchema)]
#[schema(as = Job)]
pub struct JobSchema {
    /// Job id, assigned in arrival order
    pub id: u64,
    /// Input video as seen by the workers
    pub input_path: String,
    pub status: JobStatusSchema,
    /// Stored sprite sheet name, set once the job is done
    pub result_artifact: Option<String>,
    /// Times the job has been handed to a worker
    pub attempts: u32,
    /// Why the job failed
    pub error: Option<String>,
    /// RFC 3339 timestamp
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    /// When the current worker's claim runs out
    pub lease_expires_at: Option<String>,
}

/// Job status.
#[derive(utoipa::ToSchema)]
#[schema(as = JobStatus)]
pub enum JobStatusSchema {
    #[schema(rename = "pending")]
    Pending,
    #[schema(rename = "in_progress")]
    InProgress,
    #[schema(rename = "done")]
    Done,
    #[schema(rename = "failed")]
    Failed,
}

/// What a worker receives from `POST /jobs/next`.
#[derive(utoipa::ToSchema)]
#[schema(as = JobTicket)]
pub struct JobTicketSchema {
    pub id: u64,
    /// Input video path
    pub path: String,
}

/// Job counts by status.
#[derive(utoipa::ToSchema)]
#[schema(as = QueueStats)]
pub struct QueueStatsSchema {
    pub pending: usize,
    pub in_progress: usize,
    pub done: usize,
    pub failed: usize,
}

/// Catalog search result.
#[derive(utoipa::ToSchema)]
#[schema(as = SearchHit)]
pub struct SearchHitSchema {
    pub id: String,
    pub title: String,
    /// Present when `id` is a BitTorrent info hash
    pub magnet: Option<String>,
}

/// Settings editable at runtime.
#[derive(utoipa::ToSchema)]
#[schema(as = AppSettings)]
pub struct SettingsSchema {
    pub download_dir: String,
    pub ffmpeg_preset: String,
}

/// Error body returned by every failing route.
#[derive(utoipa::ToSchema)]
#[schema(as = ErrorResponse)]
pub struct ErrorSchema {
    /// Human-readable message
    pub error: String,
    /// Stable machine-readable code
    pub code: String,
}

/// `GET /openapi.json`
pub fn openapi_routes() -> Router<AppContext> {
    Router::new().route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}

/// Write `openapi.json` and `openapi.yaml` into `dir` and return their paths.
pub fn export(dir: &Path) -> Result<(PathBuf, PathBuf)> {
    let doc = ApiDoc::openapi();
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;

    let json_path = dir.join("openapi.json");
    let json = doc
        .to_pretty_json()
        .context("Failed to serialize OpenAPI document as JSON")?;
    std::fs::write(&json_path, json).with_context(|| format!("Failed to write {:?}", json_path))?;

    let yaml_path = dir.join("openapi.yaml");
    let yaml = doc
        .to_yaml()
        .context("Failed to serialize OpenAPI document as YAML")?;
    std::fs::write(&yaml_path, yaml).with_context(|| format!("Failed to write {:?}", yaml_path))?;

    Ok((json_path, yaml_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_dispatch_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthz",
            "/search",
            "/jobs",
            "/jobs/next",
            "/jobs/{id}",
            "/jobs/{id}/done",
            "/jobs/{id}/artifact",
            "/admin/config",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let schemas = &doc.components.as_ref().unwrap().schemas;
        for name in ["Job", "JobStatus", "JobTicket", "AppSettings", "ErrorResponse"] {
            assert!(schemas.contains_key(name), "missing schema {name}");
        }
    }

    #[test]
    fn token_scheme_uses_auth_header() {
        let json = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let scheme = &json["components"]["securitySchemes"][TOKEN_SCHEME];
        assert_eq!(scheme["type"], "apiKey");
        assert_eq!(scheme["in"], "header");
        assert_eq!(scheme["name"], AUTH_HEADER);
    }

    #[test]
    fn export_writes_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let (json_path, yaml_path) = export(&dir.path().join("openapi")).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(json_path).unwrap()).unwrap();
        assert_eq!(json["info"]["title"], "mediahub API");
        assert!(std::fs::read_to_string(yaml_path)
            .unwrap()
            .contains("title: mediahub API"));
    }
}

use crate::artifacts::ArtifactStore;
use crate::config::{Config, SettingsStore};
use crate::search::{CatalogSearch, MemoryCatalog};
use crate::state::{start_reaper, JobQueue};
use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderName, Method},
    middleware, Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod auth;
pub mod error;
pub mod openapi;
pub mod routes_api;
pub mod routes_config;
pub mod routes_jobs;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub queue: Arc<JobQueue>,
    pub config: Arc<Config>,
    pub artifacts: Arc<ArtifactStore>,
    /// Settings editable through `/admin/config`
    pub settings: Arc<SettingsStore>,
    pub catalog: Arc<dyn CatalogSearch>,
}

impl AppContext {
    /// Build a context from a loaded config. `config_path` is where settings
    /// changes are written back unless `server.settings_path` overrides it.
    pub fn new(config: Config, config_path: Option<PathBuf>) -> Self {
        let settings_path = config.server.settings_path.clone().or(config_path);

        Self {
            queue: JobQueue::new(&config.dispatcher),
            artifacts: Arc::new(ArtifactStore::new(config.server.artifact_dir.clone())),
            settings: Arc::new(SettingsStore::new(config.settings.clone(), settings_path)),
            catalog: Arc::new(MemoryCatalog::new(config.catalog.clone())),
            config: Arc::new(config),
        }
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(auth::AUTH_HEADER),
        ]);

    let protected_routes = routes_jobs::job_routes()
        .merge(routes_config::config_routes())
        .layer(middleware::from_fn_with_state(
            ctx.clone(),
            auth::token_auth_middleware,
        ));

    routes_api::api_routes()
        .merge(openapi::openapi_routes())
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Start the dispatcher: lease reaper plus HTTP server.
pub async fn start_server(config: Config, config_path: Option<PathBuf>) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let reap_interval = config.dispatcher.reap_interval();
    let ctx = AppContext::new(config, config_path);
    let reaper = start_reaper(ctx.queue.clone(), reap_interval);

    tracing::info!(
        artifact_dir = ?ctx.artifacts.base_dir(),
        lease_secs = ctx.config.dispatcher.lease_secs,
        "Dispatcher ready"
    );

    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    reaper.abort();
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

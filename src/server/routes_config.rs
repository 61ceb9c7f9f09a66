//! Admin settings routes.

use crate::config::AppSettings;
use crate::error::Error;
use crate::server::error::AppError;
use crate::server::openapi::{ErrorSchema, SettingsSchema};
use crate::server::AppContext;
use axum::{extract::State, routing::get, Json, Router};

pub fn config_routes() -> Router<AppContext> {
    Router::new().route("/admin/config", get(get_settings).put(update_settings))
}

#[utoipa::path(
    get,
    path = "/admin/config",
    tag = "config",
    security(("token" = [])),
    responses(
        (status = 200, description = "Current settings", body = SettingsSchema),
        (status = 401, description = "Missing or wrong token", body = ErrorSchema)
    )
)]
pub async fn get_settings(State(ctx): State<AppContext>) -> Json<AppSettings> {
    Json(ctx.settings.load())
}

/// Replace the settings and write them back to the config file.
#[utoipa::path(
    put,
    path = "/admin/config",
    tag = "config",
    security(("token" = [])),
    request_body = SettingsSchema,
    responses(
        (status = 200, description = "Settings saved", body = SettingsSchema),
        (status = 401, description = "Missing or wrong token", body = ErrorSchema),
        (status = 500, description = "Config file could not be written", body = ErrorSchema)
    )
)]
pub async fn update_settings(
    State(ctx): State<AppContext>,
    Json(settings): Json<AppSettings>,
) -> Result<Json<AppSettings>, AppError> {
    let saved = ctx
        .settings
        .save(settings)
        .map_err(|e| Error::Internal(format!("Failed to save settings: {:#}", e)))?;

    Ok(Json(saved))
}

//! Dispatcher job routes.

use crate::error::Error;
use crate::server::error::AppError;
use crate::server::openapi::{ErrorSchema, JobSchema, JobTicketSchema};
use crate::server::AppContext;
use crate::state::{Job, JobId, JobStatus, SPRITE_FIELD};
use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::path::PathBuf;
use utoipa::ToSchema;

pub fn job_routes() -> Router<AppContext> {
    Router::new()
        .route("/jobs", get(list_jobs).post(submit_job))
        .route("/jobs/next", post(next_job))
        .route("/jobs/:id", get(get_job))
        .route("/jobs/:id/done", post(complete_job))
        .route("/jobs/:id/artifact", get(get_artifact))
}

/// Claim the oldest pending job.
#[utoipa::path(
    post,
    path = "/jobs/next",
    tag = "jobs",
    security(("token" = [])),
    responses(
        (status = 200, description = "Job claimed", body = JobTicketSchema),
        (status = 204, description = "No pending jobs"),
        (status = 401, description = "Missing or wrong token", body = ErrorSchema)
    )
)]
pub async fn next_job(State(ctx): State<AppContext>) -> Response {
    match ctx.queue.claim_next() {
        Some(job) => Json(job.ticket()).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Multipart body of a completion report.
#[derive(ToSchema)]
pub struct SpriteUpload {
    /// Sprite sheet JPEG
    #[schema(value_type = String, format = Binary)]
    pub sprite: Vec<u8>,
}

/// Report a claimed job as done and upload its sprite sheet.
#[utoipa::path(
    post,
    path = "/jobs/{id}/done",
    tag = "jobs",
    security(("token" = [])),
    params(("id" = u64, Path, description = "Job id")),
    request_body(content = SpriteUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Job marked done", body = JobSchema),
        (status = 400, description = "Missing or empty sprite field", body = ErrorSchema),
        (status = 404, description = "Unknown job", body = ErrorSchema),
        (status = 409, description = "Job is not in progress", body = ErrorSchema),
        (status = 500, description = "Sprite could not be stored; job stays in progress", body = ErrorSchema)
    )
)]
pub async fn complete_job(
    State(ctx): State<AppContext>,
    Path(id): Path<JobId>,
    mut multipart: Multipart,
) -> Result<Json<Job>, AppError> {
    // Reject stale reports before accepting any upload bytes.
    ctx.queue.ensure_in_progress(id)?;

    let (file_name, data) = read_sprite(&mut multipart).await?;

    let staged = ctx.artifacts.stage(id, file_name.as_deref(), &data).await?;
    let job = match ctx.queue.complete(id, staged.name.clone()) {
        Ok(job) => job,
        Err(e) => {
            ctx.artifacts.discard(staged).await;
            return Err(e.into());
        }
    };
    if let Err(e) = ctx.artifacts.commit(staged).await {
        // The upload never became visible, so the report as a whole failed.
        if let Some(name) = job.result_artifact.as_deref() {
            ctx.queue.revert_completion(id, name);
        }
        return Err(e.into());
    }

    Ok(Json(job))
}

async fn read_sprite(multipart: &mut Multipart) -> Result<(Option<String>, Bytes), AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(SPRITE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await?;
        if data.is_empty() {
            return Err(Error::Validation(format!("'{}' field is empty", SPRITE_FIELD)).into());
        }
        return Ok((file_name, data));
    }

    Err(Error::Validation(format!("missing multipart field '{}'", SPRITE_FIELD)).into())
}

/// Request to queue a video.
#[derive(Deserialize, ToSchema)]
pub struct SubmitJobRequest {
    /// Input video path as seen by the workers
    #[schema(value_type = String)]
    pub path: PathBuf,
}

#[utoipa::path(
    post,
    path = "/jobs",
    tag = "jobs",
    security(("token" = [])),
    request_body = SubmitJobRequest,
    responses(
        (status = 201, description = "Job queued", body = JobSchema),
        (status = 400, description = "Empty path", body = ErrorSchema)
    )
)]
pub async fn submit_job(
    State(ctx): State<AppContext>,
    Json(req): Json<SubmitJobRequest>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    if req.path.as_os_str().is_empty() {
        return Err(Error::Validation("path cannot be empty".into()).into());
    }

    let job = ctx.queue.submit(req.path);
    Ok((StatusCode::CREATED, Json(job)))
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ListJobsQuery {
    /// pending, in_progress, done or failed
    pub status: Option<String>,
}

#[utoipa::path(
    get,
    path = "/jobs",
    tag = "jobs",
    security(("token" = [])),
    params(ListJobsQuery),
    responses(
        (status = 200, description = "Jobs in id order", body = Vec<JobSchema>),
        (status = 400, description = "Unknown status filter", body = ErrorSchema)
    )
)]
pub async fn list_jobs(
    State(ctx): State<AppContext>,
    Query(params): Query<ListJobsQuery>,
) -> Result<Json<Vec<Job>>, AppError> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<JobStatus>)
        .transpose()
        .map_err(Error::Validation)?;

    Ok(Json(ctx.queue.list(status)))
}

#[utoipa::path(
    get,
    path = "/jobs/{id}",
    tag = "jobs",
    security(("token" = [])),
    params(("id" = u64, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job details", body = JobSchema),
        (status = 404, description = "Unknown job", body = ErrorSchema)
    )
)]
pub async fn get_job(
    State(ctx): State<AppContext>,
    Path(id): Path<JobId>,
) -> Result<Json<Job>, AppError> {
    ctx.queue
        .get(id)
        .map(Json)
        .ok_or_else(|| Error::not_found("job", id).into())
}

#[utoipa::path(
    get,
    path = "/jobs/{id}/artifact",
    tag = "jobs",
    security(("token" = [])),
    params(("id" = u64, Path, description = "Job id")),
    responses(
        (status = 200, description = "Sprite sheet", body = [u8], content_type = "image/jpeg"),
        (status = 404, description = "Unknown job or no artifact yet", body = ErrorSchema)
    )
)]
pub async fn get_artifact(
    State(ctx): State<AppContext>,
    Path(id): Path<JobId>,
) -> Result<Response, AppError> {
    let job = ctx.queue.get(id).ok_or_else(|| Error::not_found("job", id))?;
    let name = job
        .result_artifact
        .ok_or_else(|| Error::not_found("artifact for job", id))?;

    let bytes = ctx.artifacts.read(&name).await?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response())
}

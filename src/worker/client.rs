use crate::server::auth::AUTH_HEADER;
use crate::state::{Job, JobId, JobTicket, SPRITE_FIELD};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Why a call to the dispatcher failed.
///
/// The worker loop only recovers from `Connectivity`; every other variant
/// ends it.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The dispatcher answered with a non-2xx status.
    #[error("dispatcher returned {status}: {body}")]
    Status { status: u16, body: String },

    /// No usable response: refused, reset, DNS failure or timeout.
    #[error("dispatcher unreachable: {0}")]
    Connectivity(#[source] reqwest::Error),

    /// A 2xx response whose body could not be understood.
    #[error("malformed dispatcher response: {0}")]
    Decode(String),

    /// The request could not be built, e.g. an invalid base URL or token.
    #[error("invalid dispatcher request: {0}")]
    Request(#[source] reqwest::Error),

    /// The local artifact could not be read for upload.
    #[error("failed to read artifact {path:?}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TransportError {
    /// HTTP status of a `Status` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            TransportError::Decode(e.to_string())
        } else if e.is_connect() || e.is_timeout() || e.is_request() || e.is_body() {
            TransportError::Connectivity(e)
        } else {
            TransportError::Request(e)
        }
    }
}

/// The two dispatcher calls the worker loop depends on.
#[async_trait::async_trait]
pub trait Dispatcher: Send + Sync {
    /// Fetch the next job, `None` when the queue is empty.
    async fn next_job(&self) -> Result<Option<JobTicket>, TransportError>;

    /// Upload `artifact` as the result of job `id`.
    async fn report_done(&self, id: JobId, artifact: &Path) -> Result<(), TransportError>;
}

#[async_trait::async_trait]
impl<D: Dispatcher + ?Sized> Dispatcher for std::sync::Arc<D> {
    async fn next_job(&self) -> Result<Option<JobTicket>, TransportError> {
        (**self).next_job().await
    }

    async fn report_done(&self, id: JobId, artifact: &Path) -> Result<(), TransportError> {
        (**self).report_done(id, artifact).await
    }
}

/// HTTP client for the dispatcher API.
pub struct DispatcherClient {
    client: Client,
    base_url: String,
    token: String,
}

impl DispatcherClient {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
            tracing::warn!("Failed to build HTTP client with timeout: {}", e);
            Client::new()
        });

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Queue a new job on the dispatcher.
    pub async fn enqueue(&self, input: &Path) -> Result<Job, TransportError> {
        let response = self
            .client
            .post(self.url("/jobs"))
            .header(AUTH_HEADER, &self.token)
            .json(&serde_json::json!({ "path": input }))
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl Dispatcher for DispatcherClient {
    async fn next_job(&self) -> Result<Option<JobTicket>, TransportError> {
        let response = self
            .client
            .post(self.url("/jobs/next"))
            .header(AUTH_HEADER, &self.token)
            .send()
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let response = check_status(response).await?;
        let ticket = response.json::<JobTicket>().await?;
        Ok(Some(ticket))
    }

    async fn report_done(&self, id: JobId, artifact: &Path) -> Result<(), TransportError> {
        let data = tokio::fs::read(artifact)
            .await
            .map_err(|source| TransportError::Artifact {
                path: artifact.to_path_buf(),
                source,
            })?;

        let file_name = artifact
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{id}.jpg"));

        let part = Part::bytes(data)
            .file_name(file_name)
            .mime_str("image/jpeg")
            .map_err(TransportError::Request)?;

        let response = self
            .client
            .post(self.url(&format!("/jobs/{id}/done")))
            .header(AUTH_HEADER, &self.token)
            .multipart(Form::new().part(SPRITE_FIELD, part))
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(TransportError::Status {
        status: status.as_u16(),
        body,
    })
}

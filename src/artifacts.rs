//! On-disk storage for uploaded sprite sheets.
//!
//! Artifacts are stored flat under `{base_dir}/{job_id}-{file_name}`. The
//! job id prefix keeps names unique even when two inputs share a stem.
//!
//! Uploads are staged under a unique `.part` name and only renamed into
//! place once the job has accepted them, so a rejected duplicate report can
//! never replace or remove the artifact of the accepted one.

use crate::error::{Error, Result};
use crate::state::JobId;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

pub struct ArtifactStore {
    base_dir: PathBuf,
    staged: AtomicU64,
}

/// An upload written to disk but not yet visible under its final name.
#[derive(Debug)]
pub struct StagedArtifact {
    pub name: String,
    partial: PathBuf,
}

impl ArtifactStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            staged: AtomicU64::new(0),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Stored name for an upload, using only the final path component of the
    /// client-supplied file name.
    pub fn artifact_name(job_id: JobId, file_name: Option<&str>) -> String {
        let cleaned: String = file_name
            .and_then(|name| Path::new(name).file_name())
            .map(|name| name.to_string_lossy())
            .unwrap_or_default()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
            .collect();

        let cleaned = cleaned.trim_start_matches('.');
        if cleaned.is_empty() {
            format!("{job_id}.{}", mediahub_av::SPRITE_EXTENSION)
        } else {
            format!("{job_id}-{cleaned}")
        }
    }

    /// Write upload bytes to a private staging file.
    pub async fn stage(
        &self,
        job_id: JobId,
        file_name: Option<&str>,
        data: &[u8],
    ) -> Result<StagedArtifact> {
        tokio::fs::create_dir_all(&self.base_dir).await?;

        let name = Self::artifact_name(job_id, file_name);
        let seq = self.staged.fetch_add(1, Ordering::Relaxed);
        let partial = self.base_dir.join(format!(".{name}.{seq}.part"));

        tokio::fs::write(&partial, data).await?;
        Ok(StagedArtifact { name, partial })
    }

    /// Move a staged upload to its final name and return that name.
    ///
    /// The staging file is removed when the move fails.
    pub async fn commit(&self, staged: StagedArtifact) -> Result<String> {
        let path = self.base_dir.join(&staged.name);
        if let Err(e) = tokio::fs::rename(&staged.partial, &path).await {
            tracing::error!(path = ?path, "Failed to store artifact: {}", e);
            self.discard(staged).await;
            return Err(e.into());
        }
        tracing::debug!(path = ?path, "Stored artifact");
        Ok(staged.name)
    }

    /// Best-effort removal of a staged upload that was rejected.
    pub async fn discard(&self, staged: StagedArtifact) {
        if let Err(e) = tokio::fs::remove_file(&staged.partial).await {
            tracing::warn!(artifact = %staged.name, "Failed to discard staged artifact: {}", e);
        }
    }

    pub async fn read(&self, name: &str) -> Result<Vec<u8>> {
        match tokio::fs::read(self.base_dir.join(name)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::not_found("artifact", name))
            }
            Err(e) => Err(e.into()),
        }
    }
}

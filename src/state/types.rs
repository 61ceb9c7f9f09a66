use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub type JobId = u64;

/// Multipart field carrying the sprite sheet in a completion report.
pub const SPRITE_FIELD: &str = "sprite";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub input_path: PathBuf,
    pub status: JobStatus,
    /// File name of the stored sprite sheet, set only once the job is done.
    pub result_artifact: Option<String>,
    /// Number of times the job has been handed to a worker.
    pub attempts: u32,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub lease_expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Done,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress => "in_progress",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "in_progress" => Ok(JobStatus::InProgress),
            "done" => Ok(JobStatus::Done),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(format!("Unknown job status: {}", s)),
        }
    }
}

impl Job {
    pub fn new(id: JobId, input_path: PathBuf) -> Self {
        Self {
            id,
            input_path,
            status: JobStatus::Pending,
            result_artifact: None,
            attempts: 0,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            lease_expires_at: None,
        }
    }

    pub fn claim(&mut self, now: DateTime<Utc>, lease: chrono::Duration) {
        self.status = JobStatus::InProgress;
        self.attempts += 1;
        self.started_at = Some(now);
        self.lease_expires_at = Some(now + lease);
    }

    pub fn complete(&mut self, artifact: String, now: DateTime<Utc>) {
        self.status = JobStatus::Done;
        self.result_artifact = Some(artifact);
        self.completed_at = Some(now);
        self.lease_expires_at = None;
    }

    /// Undo `complete`, restoring the lease granted at the last claim.
    pub fn reopen(&mut self, lease: chrono::Duration) {
        self.status = JobStatus::InProgress;
        self.result_artifact = None;
        self.completed_at = None;
        self.lease_expires_at = self.started_at.map(|started| started + lease);
    }

    pub fn fail(&mut self, error: &str, now: DateTime<Utc>) {
        self.status = JobStatus::Failed;
        self.error = Some(error.to_string());
        self.completed_at = Some(now);
        self.lease_expires_at = None;
    }

    /// Return an expired in-progress job to the queue.
    pub fn release(&mut self) {
        self.status = JobStatus::Pending;
        self.started_at = None;
        self.lease_expires_at = None;
    }

    pub fn lease_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::InProgress
            && self.lease_expires_at.is_some_and(|deadline| deadline <= now)
    }

    pub fn ticket(&self) -> JobTicket {
        JobTicket {
            id: self.id,
            path: self.input_path.clone(),
        }
    }
}

/// What a worker receives from `POST /jobs/next`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTicket {
    pub id: JobId,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub pending: usize,
    pub in_progress: usize,
    pub done: usize,
    pub failed: usize,
}

impl QueueStats {
    pub fn record(&mut self, status: JobStatus) {
        match status {
            JobStatus::Pending => self.pending += 1,
            JobStatus::InProgress => self.in_progress += 1,
            JobStatus::Done => self.done += 1,
            JobStatus::Failed => self.failed += 1,
        }
    }
}

/// Outcome of one reaper pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReclaimReport {
    pub requeued: Vec<JobId>,
    pub failed: Vec<JobId>,
}

impl ReclaimReport {
    pub fn is_empty(&self) -> bool {
        self.requeued.is_empty() && self.failed.is_empty()
    }
}

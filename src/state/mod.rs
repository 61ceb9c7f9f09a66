//! Dispatcher job table.
//!
//! Every mutation goes through a single mutex, so "pick the oldest pending
//! job and mark it in progress" is one critical section: concurrent
//! `claim_next` callers never observe the same pending job.

mod types;

pub use types::*;

use crate::config::DispatcherConfig;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct JobTable {
    jobs: BTreeMap<JobId, Job>,
    /// Pending ids; ids are assigned in arrival order, so the first entry is
    /// always the oldest job.
    pending: BTreeSet<JobId>,
    last_id: JobId,
}

pub struct JobQueue {
    table: Mutex<JobTable>,
    lease: chrono::Duration,
    max_attempts: u32,
}

impl JobQueue {
    pub fn new(config: &DispatcherConfig) -> Arc<Self> {
        let lease = chrono::Duration::from_std(config.lease())
            .unwrap_or_else(|_| chrono::Duration::days(7));

        Arc::new(Self {
            table: Mutex::new(JobTable::default()),
            lease,
            max_attempts: config.max_attempts,
        })
    }

    /// Add a job to the back of the queue.
    pub fn submit(&self, input_path: PathBuf) -> Job {
        let job = {
            let mut table = self.table.lock();
            table.last_id += 1;
            let job = Job::new(table.last_id, input_path);
            table.pending.insert(job.id);
            table.jobs.insert(job.id, job.clone());
            job
        };

        tracing::info!(job_id = job.id, path = ?job.input_path, "Job queued");
        job
    }

    /// Claim the oldest pending job for a worker, or `None` if the queue is
    /// empty. Never waits for work.
    pub fn claim_next(&self) -> Option<Job> {
        let now = Utc::now();
        let job = {
            let mut table = self.table.lock();
            let id = table.pending.pop_first()?;
            let job = table.jobs.get_mut(&id)?;
            job.claim(now, self.lease);
            job.clone()
        };

        tracing::info!(
            job_id = job.id,
            attempt = job.attempts,
            path = ?job.input_path,
            "Job dispatched"
        );
        Some(job)
    }

    /// Check that a completion report for `id` would currently be accepted.
    pub fn ensure_in_progress(&self, id: JobId) -> Result<Job> {
        let table = self.table.lock();
        let job = table.jobs.get(&id).ok_or_else(|| Error::not_found("job", id))?;
        Self::require_in_progress(job)?;
        Ok(job.clone())
    }

    /// Mark an in-progress job done with its stored artifact.
    ///
    /// Fails with `Conflict` for any other state, so a duplicate or stale
    /// report never overwrites an earlier result.
    pub fn complete(&self, id: JobId, artifact: String) -> Result<Job> {
        let now = Utc::now();
        let job = {
            let mut table = self.table.lock();
            let job = table
                .jobs
                .get_mut(&id)
                .ok_or_else(|| Error::not_found("job", id))?;
            Self::require_in_progress(job)?;
            job.complete(artifact, now);
            job.clone()
        };

        tracing::info!(job_id = id, artifact = ?job.result_artifact, "Job done");
        Ok(job)
    }

    /// Return a job marked done with `artifact` to `in_progress`, for when
    /// the artifact could not be stored after all. Returns false if the job
    /// has since moved on.
    pub fn revert_completion(&self, id: JobId, artifact: &str) -> bool {
        let mut table = self.table.lock();
        let Some(job) = table.jobs.get_mut(&id) else {
            return false;
        };
        if job.status != JobStatus::Done || job.result_artifact.as_deref() != Some(artifact) {
            return false;
        }
        job.reopen(self.lease);
        drop(table);

        tracing::warn!(job_id = id, artifact, "Job completion reverted");
        true
    }

    fn require_in_progress(job: &Job) -> Result<()> {
        if job.status != JobStatus::InProgress {
            return Err(Error::Conflict(format!(
                "job {} is {}, not in_progress",
                job.id, job.status
            )));
        }
        Ok(())
    }

    pub fn get(&self, id: JobId) -> Option<Job> {
        self.table.lock().jobs.get(&id).cloned()
    }

    /// All jobs in id order, optionally filtered by status.
    pub fn list(&self, status: Option<JobStatus>) -> Vec<Job> {
        let table = self.table.lock();
        table
            .jobs
            .values()
            .filter(|job| status.map_or(true, |s| job.status == s))
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> QueueStats {
        let table = self.table.lock();
        let mut stats = QueueStats::default();
        for job in table.jobs.values() {
            stats.record(job.status);
        }
        stats
    }

    /// Return jobs whose lease ran out to the queue, or fail them once they
    /// have used up their attempts. Requeued jobs keep their original
    /// position because the pending set is ordered by id.
    pub fn reclaim_expired(&self, now: DateTime<Utc>) -> ReclaimReport {
        let mut report = ReclaimReport::default();
        let mut guard = self.table.lock();
        let table = &mut *guard;

        for job in table.jobs.values_mut().filter(|job| job.lease_expired(now)) {
            if job.attempts >= self.max_attempts {
                job.fail(
                    &format!("lease expired after {} attempts", job.attempts),
                    now,
                );
                report.failed.push(job.id);
            } else {
                job.release();
                table.pending.insert(job.id);
                report.requeued.push(job.id);
            }
        }

        report
    }
}

/// Start the background task that reclaims expired leases.
pub fn start_reaper(queue: Arc<JobQueue>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            let report = queue.reclaim_expired(Utc::now());
            if !report.requeued.is_empty() {
                tracing::warn!(jobs = ?report.requeued, "Requeued jobs with expired leases");
            }
            if !report.failed.is_empty() {
                tracing::error!(jobs = ?report.failed, "Failed jobs that exhausted their attempts");
            }
        }
    })
}

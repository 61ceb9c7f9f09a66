//! Pull-based worker.
//!
//! A worker is a two-state machine. While idle it asks the dispatcher for a
//! job; while processing it runs the transform and reports the artifact. An
//! empty queue and an unreachable dispatcher are both answered with a fixed
//! pause and another poll. Every other failure ends the loop.

pub mod client;
pub mod transform;

pub use client::{Dispatcher, DispatcherClient, TransportError};
pub use transform::{SpriteTransform, Transform};

use crate::state::{JobId, JobTicket};
use std::convert::Infallible;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Processing(JobTicket),
}

/// Result of asking the dispatcher for work, after classification.
#[derive(Debug)]
pub enum Poll {
    Job(JobTicket),
    Empty,
    Unreachable(TransportError),
}

impl Poll {
    /// Sort a `next_job` result into the cases the loop handles itself and
    /// the ones it must propagate. A 404 from `/jobs/next` means the same as
    /// 204.
    pub fn classify(result: Result<Option<JobTicket>, TransportError>) -> Result<Poll, TransportError> {
        match result {
            Ok(Some(ticket)) => Ok(Poll::Job(ticket)),
            Ok(None) => Ok(Poll::Empty),
            Err(TransportError::Status { status: 404, .. }) => Ok(Poll::Empty),
            Err(e @ TransportError::Connectivity(_)) => Ok(Poll::Unreachable(e)),
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("dispatcher error: {0}")]
    Dispatcher(#[source] TransportError),

    #[error("transform failed for job {job_id}: {source}")]
    Transform {
        job_id: JobId,
        #[source]
        source: mediahub_av::Error,
    },

    #[error("failed to report job {job_id}: {source}")]
    Report {
        job_id: JobId,
        #[source]
        source: TransportError,
    },
}

/// What a single iteration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed { job_id: JobId, artifact: PathBuf },
    Empty,
    Unreachable,
}

pub struct WorkerLoop<D, T> {
    dispatcher: D,
    transform: T,
    poll_interval: Duration,
    state: WorkerState,
}

impl<D: Dispatcher, T: Transform> WorkerLoop<D, T> {
    pub fn new(dispatcher: D, transform: T, poll_interval: Duration) -> Self {
        Self {
            dispatcher,
            transform,
            poll_interval,
            state: WorkerState::Idle,
        }
    }

    pub fn state(&self) -> &WorkerState {
        &self.state
    }

    /// One poll, plus the transform and report if a job came back. Sleeps
    /// the poll interval before returning `Empty` or `Unreachable`.
    pub async fn step(&mut self) -> Result<StepOutcome, WorkerError> {
        let poll = Poll::classify(self.dispatcher.next_job().await)
            .map_err(WorkerError::Dispatcher)?;

        match poll {
            Poll::Empty => {
                tracing::debug!("No job available, sleeping {:?}", self.poll_interval);
                tokio::time::sleep(self.poll_interval).await;
                Ok(StepOutcome::Empty)
            }
            Poll::Unreachable(e) => {
                tracing::warn!("Dispatcher unreachable, retrying in {:?}: {}", self.poll_interval, e);
                tokio::time::sleep(self.poll_interval).await;
                Ok(StepOutcome::Unreachable)
            }
            Poll::Job(ticket) => {
                self.state = WorkerState::Processing(ticket.clone());
                let result = self.process(&ticket).await;
                self.state = WorkerState::Idle;
                result
            }
        }
    }

    async fn process(&self, ticket: &JobTicket) -> Result<StepOutcome, WorkerError> {
        tracing::info!(job_id = ticket.id, path = ?ticket.path, "Processing job");

        let artifact = self
            .transform
            .run(&ticket.path)
            .await
            .map_err(|source| WorkerError::Transform {
                job_id: ticket.id,
                source,
            })?;

        self.dispatcher
            .report_done(ticket.id, &artifact)
            .await
            .map_err(|source| WorkerError::Report {
                job_id: ticket.id,
                source,
            })?;

        tracing::info!(job_id = ticket.id, artifact = ?artifact, "Job reported done");
        Ok(StepOutcome::Completed {
            job_id: ticket.id,
            artifact,
        })
    }

    /// Poll forever. Only returns when a step fails with an error the loop
    /// does not recover from.
    pub async fn run(mut self) -> Result<Infallible, WorkerError> {
        tracing::info!(poll_interval = ?self.poll_interval, "Worker started");
        loop {
            if let Err(e) = self.step().await {
                tracing::error!("Worker stopping: {}", e);
                return Err(e);
            }
        }
    }
}

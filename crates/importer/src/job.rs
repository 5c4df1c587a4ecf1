//! The `Job` contract, the generic step-pipeline runner, and the degenerate
//! job used when a pipeline cannot even be constructed.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use revport_core::status::JobStatusCode;

use crate::error::ImportError;
use crate::progress::Progress;
use crate::status::JobStatus;
use crate::step::ImportStep;

/// One schedulable, cancellable unit of import work.
///
/// A job is created when scheduled, becomes terminal exactly once, and is
/// never reused: a retried import is a new job under a new index.
#[async_trait]
pub trait Job: Send + Sync {
    /// Caller-assigned index, unique within one batch registry.
    fn index(&self) -> u32;

    fn organisation(&self) -> &str;

    fn repository(&self) -> &str;

    /// The job's status handle, readable from any task.
    fn status(&self) -> &JobStatus;

    /// Execute the job to completion. Never propagates errors: every
    /// failure is folded into the job's own status.
    async fn run(&self);

    /// Request termination. Advisory: no in-flight I/O is aborted.
    async fn cancel(&self);
}

/// Generic pipeline runner: drives an ordered list of steps, rolling back
/// all of them when any one fails.
pub struct ImportJob {
    index: u32,
    organisation: String,
    repository: String,
    status: Arc<JobStatus>,
    steps: Vec<Box<dyn ImportStep>>,
    cancel: CancellationToken,
}

impl ImportJob {
    pub fn new(
        index: u32,
        organisation: impl Into<String>,
        repository: impl Into<String>,
        steps: Vec<Box<dyn ImportStep>>,
    ) -> Self {
        Self {
            index,
            organisation: organisation.into(),
            repository: repository.into(),
            status: Arc::new(JobStatus::new(index)),
            steps,
            cancel: CancellationToken::new(),
        }
    }

    /// Roll back the entire pipeline, not just the executed prefix. Each
    /// step detects "nothing to undo" itself, which keeps rollback
    /// self-contained no matter how far execution got.
    async fn rollback_all(&self) {
        for step in &self.steps {
            let reverted = step.rollback().await;
            tracing::debug!(
                job_index = self.index,
                step = step.label(),
                reverted,
                "rollback step"
            );
        }
    }
}

#[async_trait]
impl Job for ImportJob {
    fn index(&self) -> u32 {
        self.index
    }

    fn organisation(&self) -> &str {
        &self.organisation
    }

    fn repository(&self) -> &str {
        &self.repository
    }

    fn status(&self) -> &JobStatus {
        &self.status
    }

    async fn run(&self) {
        // A job cancelled while waiting for a pool slot is already terminal
        // and must not start.
        if !self
            .status
            .transition_if_running(JobStatusCode::Sync, "Init", "Initializing import steps ...")
            .await
        {
            return;
        }
        let progress = Progress::new(self.status.clone(), self.cancel.clone());

        let mut failure: Option<ImportError> = None;
        for step in &self.steps {
            tracing::debug!(
                job_index = self.index,
                organisation = %self.organisation,
                repository = %self.repository,
                step = step.label(),
                "running import step"
            );
            if let Err(err) = step.do_import(&progress).await {
                failure = Some(err);
                break;
            }
        }

        match failure {
            None => {
                self.status
                    .transition_if_running(
                        JobStatusCode::Complete,
                        "Done",
                        "Done: repository replicated to the review site.",
                    )
                    .await;
            }
            Some(err) => {
                tracing::error!(
                    job_index = self.index,
                    organisation = %self.organisation,
                    repository = %self.repository,
                    error = %err,
                    "import job failed"
                );
                // A concurrent cancellation may already have finished the
                // job; the failure then loses the race and only the
                // rollback below still matters.
                self.status
                    .transition_if_running(JobStatusCode::Failed, "Failed", err.description())
                    .await;
                self.rollback_all().await;
            }
        }
    }

    async fn cancel(&self) {
        self.cancel.cancel();
        if self
            .status
            .transition_if_running(JobStatusCode::Cancelled, "Cancelled", "Cancelled")
            .await
        {
            self.rollback_all().await;
        }
    }
}

/// A pipeline that failed before any step existed. Terminal from birth so
/// the registry and polling machinery have a uniform job to report against.
pub struct ErrorJob {
    index: u32,
    organisation: String,
    repository: String,
    status: Arc<JobStatus>,
}

impl ErrorJob {
    pub fn new(
        index: u32,
        organisation: impl Into<String>,
        repository: impl Into<String>,
        error: &ImportError,
    ) -> Self {
        Self {
            index,
            organisation: organisation.into(),
            repository: repository.into(),
            status: Arc::new(JobStatus::failed(index, error.description())),
        }
    }
}

#[async_trait]
impl Job for ErrorJob {
    fn index(&self) -> u32 {
        self.index
    }

    fn organisation(&self) -> &str {
        &self.organisation
    }

    fn repository(&self) -> &str {
        &self.repository
    }

    fn status(&self) -> &JobStatus {
        &self.status
    }

    async fn run(&self) {}

    async fn cancel(&self) {}
}

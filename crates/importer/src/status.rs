//! Shared, concurrently-readable status handle for one job.
//!
//! The owning job task is the only writer; polling tasks read snapshots.
//! The one cross-thread write (cancellation) goes through
//! [`JobStatus::transition_if_running`], which refuses to touch a terminal
//! state, making terminal codes final by construction.

use tokio::sync::RwLock;

use revport_core::status::{JobStatusCode, JobStatusSnapshot};

#[derive(Debug)]
struct StatusInner {
    code: JobStatusCode,
    short_description: String,
    long_description: String,
}

/// Mutable status record owned by one job, shared with polling readers.
#[derive(Debug)]
pub struct JobStatus {
    index: u32,
    inner: RwLock<StatusInner>,
}

impl JobStatus {
    /// A freshly scheduled job: running, with the initial description.
    pub fn new(index: u32) -> Self {
        Self {
            index,
            inner: RwLock::new(StatusInner {
                code: JobStatusCode::Sync,
                short_description: "Init".to_string(),
                long_description: "Initializing ...".to_string(),
            }),
        }
    }

    /// A job that failed before it could start; terminal from birth.
    pub fn failed(index: u32, description: impl Into<String>) -> Self {
        Self {
            index,
            inner: RwLock::new(StatusInner {
                code: JobStatusCode::Failed,
                short_description: "Failed".to_string(),
                long_description: description.into(),
            }),
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub async fn code(&self) -> JobStatusCode {
        self.inner.read().await.code
    }

    /// Overwrite all three fields. Callers only invoke this while the job is
    /// still running, or for the single transition out of the running state.
    pub async fn update(
        &self,
        code: JobStatusCode,
        short_description: impl Into<String>,
        long_description: impl Into<String>,
    ) {
        let mut inner = self.inner.write().await;
        inner.code = code;
        inner.short_description = short_description.into();
        inner.long_description = long_description.into();
    }

    /// Overwrite using the code's own name for both descriptions.
    pub async fn update_code(&self, code: JobStatusCode) {
        self.update(code, code.as_str(), code.as_str()).await;
    }

    /// Replace only the long description, keeping code and short description.
    /// Used by progress reporting while a step runs.
    pub async fn update_progress(&self, long_description: impl Into<String>) {
        let mut inner = self.inner.write().await;
        inner.long_description = long_description.into();
    }

    /// Overwrite all three fields only while the job is still running.
    ///
    /// Returns `true` when the write was applied; `false` when another
    /// writer already finished the job. Routing every lifecycle transition
    /// through this keeps terminal states final.
    pub async fn transition_if_running(
        &self,
        code: JobStatusCode,
        short_description: impl Into<String>,
        long_description: impl Into<String>,
    ) -> bool {
        let mut inner = self.inner.write().await;
        if inner.code.is_terminal() {
            return false;
        }
        inner.code = code;
        inner.short_description = short_description.into();
        inner.long_description = long_description.into();
        true
    }

    pub async fn snapshot(&self) -> JobStatusSnapshot {
        let inner = self.inner.read().await;
        JobStatusSnapshot {
            index: self.index,
            code: inner.code,
            short_description: inner.short_description.clone(),
            long_description: inner.long_description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_status_is_running() {
        let status = JobStatus::new(1);
        assert_eq!(status.code().await, JobStatusCode::Sync);
        let snapshot = status.snapshot().await;
        assert_eq!(snapshot.short_description, "Init");
    }

    #[tokio::test]
    async fn update_code_uses_code_name_for_descriptions() {
        let status = JobStatus::new(1);
        status.update_code(JobStatusCode::Cancelled).await;
        let snapshot = status.snapshot().await;
        assert_eq!(snapshot.short_description, "cancelled");
        assert_eq!(snapshot.long_description, "cancelled");
    }

    #[tokio::test]
    async fn transition_if_running_applies_once() {
        let status = JobStatus::new(1);
        assert!(
            status
                .transition_if_running(JobStatusCode::Failed, "Failed", "boom")
                .await
        );
        assert!(
            !status
                .transition_if_running(JobStatusCode::Cancelled, "Cancelled", "Cancelled")
                .await
        );
        assert_eq!(status.code().await, JobStatusCode::Failed);
    }

    #[tokio::test]
    async fn failed_constructor_is_terminal() {
        let status = JobStatus::failed(4, "could not resolve repository");
        assert_eq!(status.code().await, JobStatusCode::Failed);
        assert!(
            !status
                .transition_if_running(JobStatusCode::Complete, "Done", "Done")
                .await
        );
    }
}

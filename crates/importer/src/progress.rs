//! Progress sink handed to each step of a running job.
//!
//! Carries the job's status handle for task/percentage reporting and the
//! cooperative cancellation token. Long-running steps call
//! [`Progress::ensure_active`] at their own checkpoints.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::{ImportError, ImportResult};
use crate::status::JobStatus;

#[derive(Debug, Default)]
struct TaskState {
    number: u32,
    name: String,
    total_units: u32,
    done_units: u32,
    last_percentage: u32,
}

impl TaskState {
    fn render(&self) -> String {
        if self.total_units > 0 {
            format!(
                "Phase-{} / {} ({}%)",
                self.number, self.name, self.last_percentage
            )
        } else {
            format!("Phase-{} / {} ...", self.number, self.name)
        }
    }
}

/// Progress reporting and cancellation for one job run.
#[derive(Clone)]
pub struct Progress {
    status: Arc<JobStatus>,
    cancel: CancellationToken,
    task: Arc<Mutex<TaskState>>,
}

impl Progress {
    pub fn new(status: Arc<JobStatus>, cancel: CancellationToken) -> Self {
        Self {
            status,
            cancel,
            task: Arc::new(Mutex::new(TaskState::default())),
        }
    }

    /// True once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Short-circuit with the cancellation signal if requested.
    pub fn ensure_active(&self) -> ImportResult<()> {
        if self.cancel.is_cancelled() {
            return Err(ImportError::Cancelled);
        }
        Ok(())
    }

    /// Begin a named task with a known number of work units (0 when the
    /// total is not known up front).
    pub async fn begin_task(&self, name: &str, total_units: u32) {
        let rendered = {
            let mut task = self.task.lock().await;
            task.number += 1;
            task.name = name.to_string();
            task.total_units = total_units;
            task.done_units = 0;
            task.last_percentage = 0;
            task.render()
        };
        self.status.update_progress(rendered).await;
    }

    /// Record completed work units within the current task.
    pub async fn update(&self, completed: u32) {
        let rendered = {
            let mut task = self.task.lock().await;
            if task.total_units == 0 {
                return;
            }
            task.done_units += completed;
            let percentage = task.done_units * 100 / task.total_units;
            if percentage > task.last_percentage {
                task.last_percentage = percentage.min(100);
            }
            task.render()
        };
        self.status.update_progress(rendered).await;
    }

    /// Finish the current task. Kept for symmetry with `begin_task`; the
    /// next `begin_task` resets the counters.
    pub async fn end_task(&self) {}
}

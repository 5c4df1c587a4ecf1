//! Per-user registry of in-flight import jobs.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::RwLock;

use revport_core::status::JobStatusSnapshot;

use crate::executor::JobExecutor;
use crate::job::Job;

/// Registry of jobs keyed by caller-assigned index, shared between the
/// scheduling path and polling readers.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across tasks. Re-scheduling an index overwrites the previous job
/// reference without cancelling it; callers do not reuse indices for live
/// jobs.
pub struct BatchImporter {
    jobs: RwLock<HashMap<u32, Arc<dyn Job>>>,
    executor: Arc<JobExecutor>,
}

impl BatchImporter {
    pub fn new(executor: Arc<JobExecutor>) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            executor,
        }
    }

    /// Insert the job into the registry and hand it to the executor.
    ///
    /// Holding the write guard across both makes the insert-and-dispatch
    /// atomic with respect to other `schedule` calls: a concurrent reader
    /// never observes a half-inserted state.
    pub async fn schedule(&self, index: u32, job: Arc<dyn Job>) {
        let mut jobs = self.jobs.write().await;
        jobs.insert(index, job.clone());
        self.executor.exec(job);
    }

    /// Point-in-time snapshot of registered jobs, sorted by index.
    pub async fn jobs(&self) -> Vec<Arc<dyn Job>> {
        let jobs = self.jobs.read().await;
        let mut snapshot: Vec<Arc<dyn Job>> = jobs.values().cloned().collect();
        snapshot.sort_by_key(|job| job.index());
        snapshot
    }

    /// Status snapshots for every registered job, for the polling display.
    pub async fn statuses(&self) -> Vec<JobStatusSnapshot> {
        let jobs = self.jobs().await;
        join_all(jobs.iter().map(|job| job.status().snapshot())).await
    }

    /// JSON rendering of [`Self::statuses`], as served to the polling UI.
    pub async fn statuses_json(&self) -> serde_json::Value {
        serde_json::to_value(self.statuses().await).unwrap_or(serde_json::Value::Null)
    }

    /// Request cancellation of every registered job. Jobs stay registered
    /// so the display can show their cancelled state.
    pub async fn cancel(&self) {
        let jobs = self.jobs().await;
        join_all(jobs.iter().map(|job| job.cancel())).await;
    }

    /// Cancel everything and clear the registry. Used when a user restarts
    /// an import session.
    pub async fn reset(&self) {
        self.cancel().await;
        self.jobs.write().await.clear();
    }
}

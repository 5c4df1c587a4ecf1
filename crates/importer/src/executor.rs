//! Bounded-concurrency job scheduler with randomized dispatch delay.
//!
//! Imports are typically scheduled in bursts ("import these 20
//! repositories"); jittering start times spreads the load on the remote
//! service instead of hammering its rate limiter all at once.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::job::Job;

/// Decides how long to wait before a scheduled job starts.
pub trait DelayPolicy: Send + Sync {
    fn delay(&self, job_index: u32) -> Duration;
}

/// Uniform random delay in `0..=max`, seeded per call from the wall clock
/// mixed with the job's index so back-to-back schedules diverge.
pub struct RandomDelay {
    max: Duration,
}

impl RandomDelay {
    pub fn new(max: Duration) -> Self {
        Self { max }
    }
}

impl DelayPolicy for RandomDelay {
    fn delay(&self, job_index: u32) -> Duration {
        let max_millis = self.max.as_millis() as u64;
        if max_millis == 0 {
            return Duration::ZERO;
        }
        let clock = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        let seed = clock ^ u64::from(job_index).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        let mut rng = StdRng::seed_from_u64(seed);
        Duration::from_millis(rng.random_range(0..=max_millis))
    }
}

/// Deterministic policy for tests and latency-sensitive deployments.
pub struct FixedDelay(pub Duration);

impl DelayPolicy for FixedDelay {
    fn delay(&self, _job_index: u32) -> Duration {
        self.0
    }
}

/// Dispatches jobs onto the runtime with a concurrency bound.
pub struct JobExecutor {
    semaphore: Arc<Semaphore>,
    delay_policy: Arc<dyn DelayPolicy>,
}

impl JobExecutor {
    /// Executor with the default randomized delay policy.
    pub fn new(pool_limit: usize, max_start_delay: Duration) -> Self {
        Self::with_delay_policy(pool_limit, Arc::new(RandomDelay::new(max_start_delay)))
    }

    pub fn with_delay_policy(pool_limit: usize, delay_policy: Arc<dyn DelayPolicy>) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(pool_limit.max(1))),
            delay_policy,
        }
    }

    /// Schedule `job.run()` after the policy's delay, bounded by the pool.
    ///
    /// Jobs carry the scheduling user's authenticated collaborator handles
    /// from construction, so execution runs with the same identity that
    /// scheduled it.
    ///
    /// Failures stay inside the job: `run()` folds every error into the
    /// job's own status, and a panicking job only poisons its own task.
    pub fn exec(&self, job: Arc<dyn Job>) -> JoinHandle<()> {
        let semaphore = self.semaphore.clone();
        let delay = self.delay_policy.delay(job.index());
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                // Closed semaphore means the executor is gone; nothing to run.
                Err(_) => return,
            };
            tracing::debug!(
                job_index = job.index(),
                organisation = %job.organisation(),
                repository = %job.repository(),
                delay_ms = delay.as_millis() as u64,
                "job dispatched"
            );
            job.run().await;
        })
    }
}

//! Job lifecycle codes and the snapshot type rendered to polling clients.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an import job.
///
/// `Sync` is the only non-terminal state. Once a job reaches `Complete`,
/// `Failed`, or `Cancelled` its code never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatusCode {
    Sync,
    Complete,
    Failed,
    Cancelled,
}

impl JobStatusCode {
    /// Lower-case name, as rendered in status JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatusCode::Sync => "sync",
            JobStatusCode::Complete => "complete",
            JobStatusCode::Failed => "failed",
            JobStatusCode::Cancelled => "cancelled",
        }
    }

    /// Returns `true` for every state except `Sync`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatusCode::Sync)
    }
}

impl std::fmt::Display for JobStatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of one job's status, safe to hand to a display layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusSnapshot {
    /// Caller-assigned job index.
    pub index: u32,
    /// Current lifecycle code.
    pub code: JobStatusCode,
    /// One or two words suitable for a progress table cell.
    pub short_description: String,
    /// Full human-readable state or failure description.
    pub long_description: String,
}

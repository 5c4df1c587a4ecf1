//! Error taxonomy for the import pipeline.
//!
//! Every failure a job can hit is routed through [`ImportError`] and
//! eventually rendered as one line of text on the job's status. Domain
//! variants carry their own description; collaborator failures fall back to
//! the decamelized kind captured at the boundary.

use revport_core::change::ChangeKey;
use revport_core::describe::{describe_external, ExternalError, MAX_CAUSE_DEPTH};

/// Result alias used throughout the importer.
pub type ImportResult<T> = Result<T, ImportError>;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The clone destination is already occupied.
    #[error("destination project {project} already exists")]
    DestinationExists { project: String },

    /// Mirroring the source repository failed.
    #[error("failed to clone from {source_uri}")]
    CloneFailed {
        source_uri: String,
        #[source]
        cause: ExternalError,
    },

    /// The source repository has protected branches; importing would strand
    /// their protection rules.
    #[error(
        "Cannot import project with protected branches, you should remove protection from: {}",
        .branches.join(",")
    )]
    ProtectedBranchesFound { branches: Vec<String> },

    /// The source repository contains refs inside review-managed namespaces.
    #[error(
        "Found {} ref(s): Please remove or rename the following ref(s) and try again: {}",
        .refs.len(),
        .refs.join(", ")
    )]
    ReviewRefsFound { refs: Vec<String> },

    /// The source repository contains refs inside the metadata namespace or
    /// magic push targets.
    #[error(
        "Found {} ref(s): Please remove or rename the following ref(s) and try again: {}",
        .refs.len(),
        .refs.join(", ")
    )]
    MetaRefsFound { refs: Vec<String> },

    /// The destination branch for a change was empty.
    #[error("destination branch cannot be empty")]
    EmptyDestinationBranch,

    /// The destination branch for a change does not exist locally.
    #[error("branch {branch} does not exist")]
    MissingBranch { branch: String },

    /// More than one change matches a correlation key on the destination
    /// branch; there is no safe way to pick one.
    #[error(
        "multiple changes with key {key} already exist on branch {branch}: cannot add a new patch set"
    )]
    AmbiguousChangeKey { key: ChangeKey, branch: String },

    /// A job could not even be constructed (dependency lookup failed before
    /// any step existed).
    #[error("import startup failed")]
    Startup {
        #[source]
        cause: Option<Box<ImportError>>,
    },

    /// A failure raised by an opaque collaborator.
    #[error(transparent)]
    External(#[from] ExternalError),

    /// Cooperative-cancellation signal. Not an error; caught only by the
    /// job's own outermost loop.
    #[error("import job cancelled")]
    Cancelled,
}

impl ImportError {
    /// Wrap a construction-time failure.
    pub fn startup(cause: ImportError) -> Self {
        ImportError::Startup {
            cause: Some(Box::new(cause)),
        }
    }

    /// One stable, human-readable line for the job status display.
    pub fn description(&self) -> String {
        self.describe(MAX_CAUSE_DEPTH)
    }

    fn describe(&self, depth: usize) -> String {
        match self {
            ImportError::CloneFailed { cause, .. } => {
                format!("Clone failed: {}", describe_external(cause))
            }
            ImportError::Startup { cause } => match cause {
                Some(inner) if depth > 0 => inner.describe(depth - 1),
                _ => "Import startup failed".to_string(),
            },
            ImportError::External(err) => describe_external(err),
            ImportError::Cancelled => "Cancelled".to_string(),
            other => other.to_string(),
        }
    }
}

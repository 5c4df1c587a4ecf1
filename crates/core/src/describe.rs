//! Human-readable descriptions for errors raised by opaque collaborators.
//!
//! Failures surfaced to the polling UI must be one stable line of text, even
//! for error kinds the pipeline has never seen before. The fallback is
//! decamelization of the error's simple type name, captured when the error
//! crosses the collaborator boundary.

use serde::{Deserialize, Serialize};

/// Upper bound on cause-chain recursion. Real cause chains are short; the
/// bound protects against self-referential chains built by broken callers.
pub const MAX_CAUSE_DEPTH: usize = 8;

/// Kind tag for errors wrapped by the git backend library rather than raised
/// directly by it. A wrapper with no cause carries no usable detail.
pub const GIT_BACKEND_WRAPPER: &str = "GitBackendInternalError";

/// Fixed description used when the git backend wrapper has no cause.
pub const GIT_BACKEND_FALLBACK: &str = "internal git error";

/// An error returned by an external collaborator (remote host client, git
/// backend, metadata store), tagged with the simple type name of the
/// underlying error and an optional cause.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ExternalError {
    kind: String,
    message: String,
    #[source]
    cause: Option<Box<ExternalError>>,
}

impl ExternalError {
    /// Wrap an arbitrary error, capturing its simple type name as the kind.
    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        Self {
            kind: simple_type_name(std::any::type_name::<E>()).to_string(),
            message: err.to_string(),
            cause: None,
        }
    }

    /// Build an error with an explicit kind, for collaborators that report
    /// failure kinds as data rather than as types.
    pub fn with_kind(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            cause: None,
        }
    }

    /// Wrap a failure raised inside the git backend library.
    pub fn git_backend(cause: Option<ExternalError>) -> Self {
        Self {
            kind: GIT_BACKEND_WRAPPER.to_string(),
            message: "git backend failure".to_string(),
            cause: cause.map(Box::new),
        }
    }

    /// Attach a cause to this error.
    pub fn caused_by(mut self, cause: ExternalError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&ExternalError> {
        self.cause.as_deref()
    }
}

/// One-line description of a collaborator error.
///
/// The git backend wrapper is unwrapped one level when it carries a cause;
/// a bare wrapper reports a fixed message. Everything else falls back to the
/// decamelized kind, which is always readable.
pub fn describe_external(err: &ExternalError) -> String {
    describe_external_bounded(err, MAX_CAUSE_DEPTH)
}

fn describe_external_bounded(err: &ExternalError, depth: usize) -> String {
    if depth == 0 {
        return decamelize(err.kind());
    }
    if err.kind() == GIT_BACKEND_WRAPPER {
        return match err.cause() {
            Some(cause) => describe_external_bounded(cause, depth - 1),
            None => GIT_BACKEND_FALLBACK.to_string(),
        };
    }
    decamelize(err.kind())
}

/// Convert a compact camel-case identifier into a lower-case, space-separated
/// phrase: `GitCloneFailedException` becomes `git clone failed exception`.
pub fn decamelize(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_uppercase() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Strip the module path from a fully qualified type name.
pub fn simple_type_name(full: &str) -> &str {
    full.rsplit("::").next().unwrap_or(full)
}

//! The unit of pipeline work: one stage of an import, with a paired undo.

use async_trait::async_trait;

use crate::error::ImportResult;
use crate::progress::Progress;

/// One stage of a multi-stage import job.
///
/// A step is bound at construction to its organisation/repository and any
/// collaborator handles it needs, and keeps only what it must remember to
/// undo its own effect.
#[async_trait]
pub trait ImportStep: Send + Sync {
    /// Short name used in logs.
    fn label(&self) -> &'static str;

    /// Perform this stage. Errors stop the pipeline.
    async fn do_import(&self, progress: &Progress) -> ImportResult<()>;

    /// Undo this stage's effect if it was applied.
    ///
    /// Safe to call even if `do_import` never ran or failed partway: the
    /// step detects "nothing to undo" itself and returns `false` in that
    /// case, `true` when it reverted something.
    async fn rollback(&self) -> bool;
}

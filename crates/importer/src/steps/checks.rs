//! Read-only validation steps run before anything destructive.
//!
//! Each scans the source repository's refs or branches and fails the job
//! with the full list of offenders if the source already uses names the
//! destination reserves for itself. Rollback is trivially satisfied.

use std::sync::Arc;

use async_trait::async_trait;

use revport_core::refs;

use crate::error::{ImportError, ImportResult};
use crate::hosting::CodeHost;
use crate::progress::Progress;
use crate::step::ImportStep;

/// Fails when the source repository has protected branches: their
/// protection rules would be silently dropped on import.
pub struct ProtectedBranchesCheckStep {
    host: Arc<dyn CodeHost>,
    organisation: String,
    repository: String,
    /// Deployment override to import anyway.
    ignore_branch_protection: bool,
}

impl ProtectedBranchesCheckStep {
    pub fn new(
        host: Arc<dyn CodeHost>,
        organisation: impl Into<String>,
        repository: impl Into<String>,
        ignore_branch_protection: bool,
    ) -> Self {
        Self {
            host,
            organisation: organisation.into(),
            repository: repository.into(),
            ignore_branch_protection,
        }
    }
}

#[async_trait]
impl ImportStep for ProtectedBranchesCheckStep {
    fn label(&self) -> &'static str {
        "protected-branches-check"
    }

    async fn do_import(&self, progress: &Progress) -> ImportResult<()> {
        if self.ignore_branch_protection {
            return Ok(());
        }

        let branches = self
            .host
            .branches(&self.organisation, &self.repository)
            .await?;
        progress
            .begin_task("Checking branch protection", branches.len() as u32)
            .await;

        let mut protected = Vec::new();
        for branch in branches {
            if branch.protected {
                protected.push(branch.name);
            }
            progress.update(1).await;
        }
        progress.end_task().await;

        if protected.is_empty() {
            Ok(())
        } else {
            Err(ImportError::ProtectedBranchesFound {
                branches: protected,
            })
        }
    }

    async fn rollback(&self) -> bool {
        true
    }
}

/// Fails when the source repository contains refs inside namespaces the
/// review system manages (change refs, user refs, ...) or magic push
/// targets.
pub struct ReviewRefsCheckStep {
    host: Arc<dyn CodeHost>,
    organisation: String,
    repository: String,
}

impl ReviewRefsCheckStep {
    pub fn new(
        host: Arc<dyn CodeHost>,
        organisation: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self {
            host,
            organisation: organisation.into(),
            repository: repository.into(),
        }
    }
}

#[async_trait]
impl ImportStep for ReviewRefsCheckStep {
    fn label(&self) -> &'static str {
        "review-refs-check"
    }

    async fn do_import(&self, progress: &Progress) -> ImportResult<()> {
        let all_refs = self.host.refs(&self.organisation, &self.repository).await?;
        progress
            .begin_task("Checking review-managed refs", all_refs.len() as u32)
            .await;

        let mut offending = Vec::new();
        for remote_ref in all_refs {
            if refs::is_magic_ref(&remote_ref.name) || refs::is_review_managed_ref(&remote_ref.name)
            {
                offending.push(remote_ref.name);
            }
            progress.update(1).await;
        }
        progress.end_task().await;

        if offending.is_empty() {
            Ok(())
        } else {
            Err(ImportError::ReviewRefsFound { refs: offending })
        }
    }

    async fn rollback(&self) -> bool {
        true
    }
}

/// Fails when the source repository contains magic push targets or refs in
/// the metadata namespace.
pub struct MetaRefCheckStep {
    host: Arc<dyn CodeHost>,
    organisation: String,
    repository: String,
}

impl MetaRefCheckStep {
    pub fn new(
        host: Arc<dyn CodeHost>,
        organisation: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self {
            host,
            organisation: organisation.into(),
            repository: repository.into(),
        }
    }
}

#[async_trait]
impl ImportStep for MetaRefCheckStep {
    fn label(&self) -> &'static str {
        "meta-ref-check"
    }

    async fn do_import(&self, progress: &Progress) -> ImportResult<()> {
        let all_refs = self.host.refs(&self.organisation, &self.repository).await?;
        progress
            .begin_task("Checking magic refs", all_refs.len() as u32)
            .await;

        let mut offending = Vec::new();
        for remote_ref in all_refs {
            if refs::is_magic_ref(&remote_ref.name) || refs::is_meta_ref(&remote_ref.name) {
                offending.push(remote_ref.name);
            }
            progress.update(1).await;
        }
        progress.end_task().await;

        if offending.is_empty() {
            Ok(())
        } else {
            Err(ImportError::MetaRefsFound { refs: offending })
        }
    }

    async fn rollback(&self) -> bool {
        true
    }
}

//! Turns one imported commit into a change or a patch set on the
//! destination branch.
//!
//! Revision dedup comes first: a commit whose id is already known as a
//! patch set was imported by a previous run and is skipped. The correlation
//! key then decides between updating an existing change and creating a new
//! one; more than one candidate is unresolvable and fails the job.

use std::sync::Arc;

use revport_core::change::{self, ChangeKey};

use crate::error::{ImportError, ImportResult};
use crate::review::{ChangeId, ChangeStore, NewChange, NewPatchSet};
use crate::storage::{CommitRecord, RepoHandle};

pub struct ChangeCreator {
    changes: Arc<dyn ChangeStore>,
}

impl ChangeCreator {
    pub fn new(changes: Arc<dyn ChangeStore>) -> Self {
        Self { changes }
    }

    /// Insert `commit` on `destination_branch` of `project`.
    ///
    /// Returns the affected change id, or `None` when the commit was
    /// already imported.
    #[allow(clippy::too_many_arguments)]
    pub async fn add_commit_to_change(
        &self,
        project: &str,
        repo: &dyn RepoHandle,
        destination_branch: &str,
        owner: crate::review::AccountId,
        commit: &CommitRecord,
        message: String,
        topic: Option<String>,
    ) -> ImportResult<Option<ChangeId>> {
        if destination_branch.is_empty() {
            return Err(ImportError::EmptyDestinationBranch);
        }
        if !repo.branch_exists(destination_branch).await? {
            return Err(ImportError::MissingBranch {
                branch: destination_branch.to_string(),
            });
        }

        if let Some(existing) = self.changes.find_patch_set_by_revision(&commit.sha).await? {
            tracing::debug!(
                sha = %commit.sha,
                change = %existing.change,
                patch_set = existing.number,
                "commit already uploaded as a patch set, skipping"
            );
            return Ok(None);
        }

        let key = correlation_key(commit);
        let candidates = self
            .changes
            .find_changes_by_key(project, destination_branch, &key)
            .await?;

        match candidates.as_slice() {
            [] => {
                let id = self
                    .changes
                    .insert_change(NewChange {
                        project: project.to_string(),
                        branch: destination_branch.to_string(),
                        key,
                        owner,
                        commit_sha: commit.sha.clone(),
                        message,
                        topic,
                    })
                    .await?;
                Ok(Some(id))
            }
            [existing] => {
                let patch_set = self
                    .changes
                    .insert_patch_set(
                        *existing,
                        NewPatchSet {
                            owner,
                            commit_sha: commit.sha.clone(),
                            message,
                        },
                    )
                    .await?;
                Ok(Some(patch_set.change))
            }
            _ => Err(ImportError::AmbiguousChangeKey {
                key,
                branch: destination_branch.to_string(),
            }),
        }
    }
}

/// Correlation key for a commit: its `Change-Id` trailer when present,
/// otherwise a key computed from the commit content.
pub fn correlation_key(commit: &CommitRecord) -> ChangeKey {
    change::key_from_message(&commit.message).unwrap_or_else(|| {
        change::computed_key(
            &commit.tree,
            &commit.parents,
            &commit.author,
            &commit.committer,
            &commit.message,
        )
    })
}

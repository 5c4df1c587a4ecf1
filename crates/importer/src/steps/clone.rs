//! Mirrors the source repository into the destination git directory.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use revport_core::refs::CLONE_REFSPEC;

use crate::config::ImporterConfig;
use crate::error::{ImportError, ImportResult};
use crate::hosting::HostCredentials;
use crate::progress::Progress;
use crate::step::ImportStep;
use crate::storage::RepoStorage;

/// Fetches every ref from the source repository into the destination.
///
/// The destination path is claimed at construction time: if it already
/// exists the import conflicts with an earlier one and fails before any
/// network I/O happens.
pub struct GitCloneStep {
    project: String,
    source_uri: String,
    credentials: HostCredentials,
    destination: PathBuf,
    storage: Arc<dyn RepoStorage>,
}

impl std::fmt::Debug for GitCloneStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitCloneStep")
            .field("project", &self.project)
            .field("source_uri", &self.source_uri)
            .field("credentials", &self.credentials)
            .field("destination", &self.destination)
            .field("storage", &"<dyn RepoStorage>")
            .finish()
    }
}

impl GitCloneStep {
    pub fn new(
        config: &ImporterConfig,
        source_uri: String,
        credentials: HostCredentials,
        storage: Arc<dyn RepoStorage>,
        organisation: &str,
        repository: &str,
    ) -> ImportResult<Self> {
        let project = ImporterConfig::project_name(organisation, repository);
        let destination = config.destination_path(organisation, repository);
        if destination.exists() {
            return Err(ImportError::DestinationExists { project });
        }

        Ok(Self {
            project,
            source_uri,
            credentials,
            destination,
            storage,
        })
    }

    /// The path this step clones into.
    pub fn destination(&self) -> &PathBuf {
        &self.destination
    }
}

#[async_trait]
impl ImportStep for GitCloneStep {
    fn label(&self) -> &'static str {
        "git-clone"
    }

    async fn do_import(&self, progress: &Progress) -> ImportResult<()> {
        progress.begin_task("Fetching repository", 0).await;
        tracing::info!(
            source_uri = %self.source_uri,
            destination = %self.destination.display(),
            "cloning repository"
        );

        let repo = self.storage.open(&self.project).await?;
        repo.fetch(&self.source_uri, CLONE_REFSPEC, &self.credentials)
            .await
            .map_err(|cause| ImportError::CloneFailed {
                source_uri: self.source_uri.clone(),
                cause,
            })?;
        progress.end_task().await;
        Ok(())
    }

    async fn rollback(&self) -> bool {
        if !self.destination.exists() {
            return false;
        }

        match tokio::fs::remove_dir_all(&self.destination).await {
            Ok(()) => {
                self.storage.evict(&self.project).await;
                true
            }
            Err(err) => {
                tracing::error!(
                    destination = %self.destination.display(),
                    error = %err,
                    "cannot clean up destination git directory"
                );
                false
            }
        }
    }
}

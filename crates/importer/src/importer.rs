//! Per-user import facades: assemble a pipeline or a specialized job and
//! hand it to the batch registry. Construction failures become an
//! [`ErrorJob`] so the polling UI always has something to report against.

use std::sync::Arc;

use crate::batch::BatchImporter;
use crate::config::ImporterConfig;
use crate::error::{ImportError, ImportResult};
use crate::executor::JobExecutor;
use crate::hosting::CodeHost;
use crate::job::{ErrorJob, ImportJob};
use crate::pull_request::PullRequestImportJob;
use crate::review::{
    AccountDirectory, ChangeStore, ProjectMetadata, ReplicationRegistry,
};
use crate::step::ImportStep;
use crate::steps::{
    CreateProjectStep, GitCloneStep, MetaRefCheckStep, ProtectedBranchesCheckStep,
    ReplicateProjectStep, ReviewRefsCheckStep,
};
use crate::storage::RepoStorage;

/// Imports whole repositories: validation checks, clone, project creation,
/// replication.
pub struct RepoImporter {
    batch: BatchImporter,
    config: ImporterConfig,
    host: Arc<dyn CodeHost>,
    storage: Arc<dyn RepoStorage>,
    metadata: Arc<dyn ProjectMetadata>,
    replication: Arc<dyn ReplicationRegistry>,
}

impl RepoImporter {
    pub fn new(
        executor: Arc<JobExecutor>,
        config: ImporterConfig,
        host: Arc<dyn CodeHost>,
        storage: Arc<dyn RepoStorage>,
        metadata: Arc<dyn ProjectMetadata>,
        replication: Arc<dyn ReplicationRegistry>,
    ) -> Self {
        Self {
            batch: BatchImporter::new(executor),
            config,
            host,
            storage,
            metadata,
            replication,
        }
    }

    /// Schedule a repository import under the given index.
    ///
    /// The remote repository is looked up before any step exists; a failure
    /// here produces an [`ErrorJob`] so the polling UI still sees the
    /// import.
    pub async fn import_repository(
        &self,
        index: u32,
        organisation: &str,
        repository: &str,
        description: Option<String>,
    ) {
        let remote = match self.host.repository(organisation, repository).await {
            Ok(remote) => remote,
            Err(err) => {
                let err = ImportError::startup(ImportError::External(err));
                tracing::warn!(
                    index,
                    organisation,
                    repository,
                    error = %err,
                    "remote repository lookup failed"
                );
                self.batch
                    .schedule(index, Arc::new(ErrorJob::new(index, organisation, repository, &err)))
                    .await;
                return;
            }
        };
        let description = description.or(remote.description);

        match self.build_pipeline(index, organisation, repository, description) {
            Ok(job) => {
                tracing::debug!(index, organisation, repository, "repository import scheduled");
                self.batch.schedule(index, Arc::new(job)).await;
            }
            Err(err) => {
                tracing::warn!(
                    index,
                    organisation,
                    repository,
                    error = %err,
                    "repository import failed before start"
                );
                self.batch
                    .schedule(index, Arc::new(ErrorJob::new(index, organisation, repository, &err)))
                    .await;
            }
        }
    }

    fn build_pipeline(
        &self,
        index: u32,
        organisation: &str,
        repository: &str,
        description: Option<String>,
    ) -> ImportResult<ImportJob> {
        let credentials = self.host.credentials();
        let source_uri = self.host.clone_url(organisation, repository);

        let steps: Vec<Box<dyn ImportStep>> = vec![
            Box::new(ProtectedBranchesCheckStep::new(
                self.host.clone(),
                organisation,
                repository,
                self.config.ignore_branch_protection,
            )),
            Box::new(ReviewRefsCheckStep::new(
                self.host.clone(),
                organisation,
                repository,
            )),
            Box::new(MetaRefCheckStep::new(
                self.host.clone(),
                organisation,
                repository,
            )),
            Box::new(
                GitCloneStep::new(
                    &self.config,
                    source_uri.clone(),
                    credentials.clone(),
                    self.storage.clone(),
                    organisation,
                    repository,
                )
                .map_err(ImportError::startup)?,
            ),
            Box::new(CreateProjectStep::new(
                self.metadata.clone(),
                organisation,
                repository,
                description,
                credentials.username.clone(),
                source_uri,
            )),
            Box::new(ReplicateProjectStep::new(
                self.replication.clone(),
                self.config.host_url.clone(),
                credentials,
                organisation,
                repository,
            )),
        ];

        Ok(ImportJob::new(index, organisation, repository, steps))
    }

    /// The underlying registry, for status polling and bulk operations.
    pub fn batch(&self) -> &BatchImporter {
        &self.batch
    }
}

/// Imports single pull requests into existing projects.
pub struct PullRequestImporter {
    batch: BatchImporter,
    host: Arc<dyn CodeHost>,
    storage: Arc<dyn RepoStorage>,
    accounts: Arc<dyn AccountDirectory>,
    changes: Arc<dyn ChangeStore>,
}

impl PullRequestImporter {
    pub fn new(
        executor: Arc<JobExecutor>,
        host: Arc<dyn CodeHost>,
        storage: Arc<dyn RepoStorage>,
        accounts: Arc<dyn AccountDirectory>,
        changes: Arc<dyn ChangeStore>,
    ) -> Self {
        Self {
            batch: BatchImporter::new(executor),
            host,
            storage,
            accounts,
            changes,
        }
    }

    /// Schedule a pull request import under the given index.
    pub async fn import_pull_request(
        &self,
        index: u32,
        organisation: &str,
        repository: &str,
        pull_request_number: u64,
    ) {
        let job = PullRequestImportJob::new(
            index,
            organisation,
            repository,
            pull_request_number,
            self.host.clone(),
            self.storage.clone(),
            self.accounts.clone(),
            self.changes.clone(),
        );
        tracing::debug!(
            index,
            organisation,
            repository,
            pull_request_number,
            "pull request import scheduled"
        );
        self.batch.schedule(index, Arc::new(job)).await;
    }

    /// The underlying registry, for status polling and bulk operations.
    pub fn batch(&self) -> &BatchImporter {
        &self.batch
    }
}

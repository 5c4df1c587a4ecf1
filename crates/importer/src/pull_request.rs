//! Imports one pull request as a series of changes on the destination
//! branch, one patch set per commit, oldest commit first.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use revport_core::change::{change_message, topic_for_pull_request};
use revport_core::identity::AuthorIdentity;
use revport_core::refs::pull_request_refspec;
use revport_core::status::JobStatusCode;

use crate::config::ImporterConfig;
use crate::create_change::ChangeCreator;
use crate::error::{ImportError, ImportResult};
use crate::hosting::CodeHost;
use crate::job::Job;
use crate::progress::Progress;
use crate::review::{AccountDirectory, AccountId, ChangeId, ChangeStore};
use crate::status::JobStatus;
use crate::storage::RepoStorage;

/// Single-purpose job importing one pull request.
pub struct PullRequestImportJob {
    index: u32,
    organisation: String,
    repository: String,
    pull_request_number: u64,
    host: Arc<dyn CodeHost>,
    storage: Arc<dyn RepoStorage>,
    accounts: Arc<dyn AccountDirectory>,
    creator: ChangeCreator,
    status: Arc<JobStatus>,
    cancel: CancellationToken,
}

impl PullRequestImportJob {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        index: u32,
        organisation: impl Into<String>,
        repository: impl Into<String>,
        pull_request_number: u64,
        host: Arc<dyn CodeHost>,
        storage: Arc<dyn RepoStorage>,
        accounts: Arc<dyn AccountDirectory>,
        changes: Arc<dyn ChangeStore>,
    ) -> Self {
        Self {
            index,
            organisation: organisation.into(),
            repository: repository.into(),
            pull_request_number,
            host,
            storage,
            accounts,
            creator: ChangeCreator::new(changes),
            status: Arc::new(JobStatus::new(index)),
            cancel: CancellationToken::new(),
        }
    }

    async fn import(&self) -> ImportResult<Vec<ChangeId>> {
        let progress = Progress::new(self.status.clone(), self.cancel.clone());
        let project = ImporterConfig::project_name(&self.organisation, &self.repository);

        progress.ensure_active()?;
        self.status
            .update(
                JobStatusCode::Sync,
                "Fetch info",
                "Getting pull request info ...",
            )
            .await;
        let pr = self
            .host
            .pull_request(
                &self.organisation,
                &self.repository,
                self.pull_request_number,
            )
            .await?;

        progress.ensure_active()?;
        let repo = self.storage.open(&project).await?;

        progress.ensure_active()?;
        self.status
            .update(
                JobStatusCode::Sync,
                "Fetching",
                "Fetching pull request from the source host ...",
            )
            .await;
        repo.fetch(
            &self.host.clone_url(&self.organisation, &self.repository),
            &pull_request_refspec(pr.number),
            &self.host.credentials(),
        )
        .await?;

        progress.ensure_active()?;
        // The host's commit list bounds the import; the local walk fixes
        // the order, regardless of how the host happened to sort it.
        let listed: HashSet<String> = self
            .host
            .pull_request_commits(
                &self.organisation,
                &self.repository,
                self.pull_request_number,
            )
            .await?
            .into_iter()
            .map(|commit| commit.sha)
            .collect();

        let mut commits = repo.walk_range(&pr.base.sha, &pr.head.sha).await?;
        // The walk yields newest first; patch sets must land oldest first.
        commits.reverse();

        let message = change_message(&pr.url, &pr.title, &pr.body);
        let topic = topic_for_pull_request(pr.number);

        let mut change_ids = Vec::new();
        let mut patch_number: u32 = 1;
        for commit in commits {
            if !listed.contains(&commit.sha) {
                continue;
            }
            self.status
                .update(
                    JobStatusCode::Sync,
                    format!("Patch #{patch_number}"),
                    format!("Patch #{patch_number}: inserting pull request commit"),
                )
                .await;

            let identity = AuthorIdentity::resolve(pr.author.as_ref(), &commit.author);
            let owner = self.get_or_register_account(&identity).await?;

            let inserted = self
                .creator
                .add_commit_to_change(
                    &project,
                    repo.as_ref(),
                    &pr.base.branch,
                    owner,
                    &commit,
                    message.clone(),
                    Some(topic.clone()),
                )
                .await?;
            if let Some(id) = inserted {
                if !change_ids.contains(&id) {
                    change_ids.push(id);
                }
            }
            patch_number += 1;
        }

        Ok(change_ids)
    }

    async fn get_or_register_account(
        &self,
        identity: &AuthorIdentity,
    ) -> ImportResult<AccountId> {
        if let Some(existing) = self
            .accounts
            .find_by_external_login(&identity.login)
            .await?
        {
            return Ok(existing);
        }
        tracing::info!(login = %identity.login, "importing account on demand");
        Ok(self
            .accounts
            .import_account(&identity.login, &identity.name, &identity.email)
            .await?)
    }
}

#[async_trait]
impl Job for PullRequestImportJob {
    fn index(&self) -> u32 {
        self.index
    }

    fn organisation(&self) -> &str {
        &self.organisation
    }

    fn repository(&self) -> &str {
        &self.repository
    }

    fn status(&self) -> &JobStatus {
        &self.status
    }

    async fn run(&self) {
        match self.import().await {
            Ok(change_ids) => {
                let ids: Vec<String> = change_ids.iter().map(ChangeId::to_string).collect();
                self.status
                    .update(
                        JobStatusCode::Complete,
                        "Imported",
                        format!("Pull request imported as changes [{}]", ids.join(", ")),
                    )
                    .await;
            }
            Err(ImportError::Cancelled) => {
                self.status.update_code(JobStatusCode::Cancelled).await;
            }
            Err(err) => {
                tracing::error!(
                    pull_request = self.pull_request_number,
                    organisation = %self.organisation,
                    repository = %self.repository,
                    error = %err,
                    "pull request import failed"
                );
                self.status
                    .transition_if_running(JobStatusCode::Failed, "Failed", err.description())
                    .await;
            }
        }
    }

    async fn cancel(&self) {
        self.cancel.cancel();
    }
}

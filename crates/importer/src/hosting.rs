//! Collaborator seam for the remote code hosting service.
//!
//! The pipeline only ever issues simple lookups against the host; transport,
//! authentication, and rate limiting live behind this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use revport_core::describe::ExternalError;
use revport_core::identity::{GitIdentity, RemoteUser};

/// Credentials of the user on whose behalf an import runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCredentials {
    pub username: String,
    pub token: String,
}

/// Repository metadata as reported by the hosting service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteRepositoryInfo {
    pub description: Option<String>,
    pub private: bool,
    pub default_branch: String,
}

/// A single ref name on the remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRef {
    pub name: String,
}

/// A branch on the remote repository, with its protection flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteBranch {
    pub name: String,
    pub protected: bool,
}

/// One side of a pull request (base or head).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestSide {
    /// Branch ref name, e.g. `refs/heads/main` or a bare branch name.
    pub branch: String,
    /// Commit id the side points at.
    pub sha: String,
}

/// Pull request metadata needed by the import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestInfo {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub url: String,
    pub base: PullRequestSide,
    pub head: PullRequestSide,
    /// The user who opened the pull request, when the host still knows them.
    pub author: Option<RemoteUser>,
}

/// One commit of a pull request as listed by the hosting service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestCommit {
    pub sha: String,
    /// Raw git author identity recorded in the commit.
    pub author: GitIdentity,
}

/// Read-only client for the remote hosting service, bound to one
/// authenticated user.
#[async_trait]
pub trait CodeHost: Send + Sync {
    /// Base URL of the hosting service, without a trailing slash.
    fn base_url(&self) -> &str;

    /// Credentials of the authenticated user, reused for fetch and
    /// replication.
    fn credentials(&self) -> HostCredentials;

    /// Clone URL for a repository.
    fn clone_url(&self, organisation: &str, repository: &str) -> String {
        format!("{}/{organisation}/{repository}.git", self.base_url())
    }

    async fn repository(
        &self,
        organisation: &str,
        repository: &str,
    ) -> Result<RemoteRepositoryInfo, ExternalError>;

    async fn refs(
        &self,
        organisation: &str,
        repository: &str,
    ) -> Result<Vec<RemoteRef>, ExternalError>;

    async fn branches(
        &self,
        organisation: &str,
        repository: &str,
    ) -> Result<Vec<RemoteBranch>, ExternalError>;

    async fn pull_request(
        &self,
        organisation: &str,
        repository: &str,
        number: u64,
    ) -> Result<PullRequestInfo, ExternalError>;

    async fn pull_request_commits(
        &self,
        organisation: &str,
        repository: &str,
        number: u64,
    ) -> Result<Vec<PullRequestCommit>, ExternalError>;
}

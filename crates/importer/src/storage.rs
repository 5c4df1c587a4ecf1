//! Collaborator seam for the destination-side git repository storage.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use revport_core::describe::ExternalError;
use revport_core::identity::GitIdentity;

use crate::hosting::HostCredentials;

/// A commit as read from the local object store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    pub sha: String,
    pub tree: String,
    pub parents: Vec<String>,
    pub author: GitIdentity,
    pub committer: GitIdentity,
    pub message: String,
}

/// Open handle on one destination repository.
#[async_trait]
pub trait RepoHandle: Send + Sync {
    /// Fetch from `source_uri` using the given refspec and credentials.
    async fn fetch(
        &self,
        source_uri: &str,
        refspec: &str,
        credentials: &HostCredentials,
    ) -> Result<(), ExternalError>;

    /// Walk the commit graph from `head_sha`, excluding `base_sha` and its
    /// ancestors. Commits are returned in natural topological order,
    /// newest first.
    async fn walk_range(
        &self,
        base_sha: &str,
        head_sha: &str,
    ) -> Result<Vec<CommitRecord>, ExternalError>;

    /// True when the named branch exists in this repository.
    async fn branch_exists(&self, branch: &str) -> Result<bool, ExternalError>;
}

/// Factory/cache of repository handles, keyed by project name.
#[async_trait]
pub trait RepoStorage: Send + Sync {
    /// Open (or initialize) the repository backing `project`.
    async fn open(&self, project: &str) -> Result<Arc<dyn RepoHandle>, ExternalError>;

    /// Drop any cached handle for `project`. Called when the on-disk
    /// repository is removed out from under the cache.
    async fn evict(&self, project: &str);
}

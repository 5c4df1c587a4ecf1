//! Collaborator seams for the destination review system: accounts, changes
//! and patch sets, project metadata, and replication remotes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use revport_core::change::ChangeKey;
use revport_core::describe::ExternalError;

/// Identifier of a local account.
pub type AccountId = u64;

/// Identifier of a change in the review system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeId(pub u64);

impl std::fmt::Display for ChangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A patch set within a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSetRef {
    pub change: ChangeId,
    pub number: u32,
}

/// Account lookup and import-on-demand.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Find an account by the external login recorded for it.
    async fn find_by_external_login(
        &self,
        login: &str,
    ) -> Result<Option<AccountId>, ExternalError>;

    /// Create a local account for a remote user.
    async fn import_account(
        &self,
        login: &str,
        name: &str,
        email: &str,
    ) -> Result<AccountId, ExternalError>;
}

/// A change to be created on the destination branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChange {
    pub project: String,
    pub branch: String,
    pub key: ChangeKey,
    pub owner: AccountId,
    pub commit_sha: String,
    pub message: String,
    pub topic: Option<String>,
}

/// A patch set to be appended to an existing change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatchSet {
    pub owner: AccountId,
    pub commit_sha: String,
    pub message: String,
}

/// Change and patch-set storage.
#[async_trait]
pub trait ChangeStore: Send + Sync {
    /// Look up an existing patch set by commit id, across all changes.
    async fn find_patch_set_by_revision(
        &self,
        sha: &str,
    ) -> Result<Option<PatchSetRef>, ExternalError>;

    /// All changes on `branch` of `project` carrying the correlation key.
    async fn find_changes_by_key(
        &self,
        project: &str,
        branch: &str,
        key: &ChangeKey,
    ) -> Result<Vec<ChangeId>, ExternalError>;

    async fn insert_change(&self, change: NewChange) -> Result<ChangeId, ExternalError>;

    async fn insert_patch_set(
        &self,
        change: ChangeId,
        patch_set: NewPatchSet,
    ) -> Result<PatchSetRef, ExternalError>;
}

/// How the review system submits changes of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitType {
    MergeIfNecessary,
    MergeAlways,
    RebaseIfNecessary,
    FastForwardOnly,
    CherryPick,
}

/// Tri-state settings inherited from the parent project unless overridden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InheritableFlag {
    True,
    False,
    Inherit,
}

/// Project-level settings written by the create-project step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSettings {
    pub description: Option<String>,
    pub submit_type: SubmitType,
    pub use_contributor_agreements: InheritableFlag,
    pub use_signed_off_by: InheritableFlag,
    pub use_content_merge: InheritableFlag,
    pub require_change_id: InheritableFlag,
}

/// A permission grant on a ref pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRule {
    pub ref_pattern: String,
    pub permission: Permission,
    /// Group the rule applies to (a per-user group for imported projects).
    pub group: String,
    /// Vote range for label permissions.
    pub range: Option<(i8, i8)>,
    pub force: bool,
}

/// Permissions grantable on a ref pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permission {
    Owner,
    Read,
    Push,
    Create,
    PushMerge,
    Submit,
    Rebase,
    RemoveReviewer,
    Label(String),
}

/// One atomic metadata update on a project.
#[async_trait]
pub trait MetadataTransaction: Send {
    fn set_settings(&mut self, settings: ProjectSettings);
    fn grant(&mut self, rule: AccessRule);

    /// Commit the accumulated updates with a log message.
    async fn commit(self: Box<Self>, message: &str) -> Result<(), ExternalError>;
}

/// Project metadata store.
#[async_trait]
pub trait ProjectMetadata: Send + Sync {
    /// Open a metadata transaction for `project`, creating the project
    /// record if it does not exist yet.
    async fn begin(&self, project: &str) -> Result<Box<dyn MetadataTransaction>, ExternalError>;
}

/// Replication remote configuration, keyed by the importing user's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationRemote {
    pub name: String,
    pub username: String,
    pub password: String,
    pub url: Option<String>,
    pub push: Option<String>,
    pub projects: Vec<String>,
}

/// Registry of replication targets.
#[async_trait]
pub trait ReplicationRegistry: Send + Sync {
    /// Current remote config for `name`, if one exists.
    async fn remote(&self, name: &str) -> Result<Option<ReplicationRemote>, ExternalError>;

    /// Create or replace the remote config.
    async fn update(&self, remote: ReplicationRemote) -> Result<(), ExternalError>;
}

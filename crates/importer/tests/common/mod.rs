//! In-memory fakes for the collaborator seams, shared by the scenario
//! tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use revport_core::describe::ExternalError;
use revport_core::identity::{GitIdentity, RemoteUser};

use revport_importer::hosting::{
    CodeHost, HostCredentials, PullRequestCommit, PullRequestInfo, PullRequestSide, RemoteBranch,
    RemoteRef, RemoteRepositoryInfo,
};
use revport_importer::review::{
    AccessRule, AccountDirectory, AccountId, ChangeId, ChangeStore, MetadataTransaction,
    NewChange, NewPatchSet, PatchSetRef, ProjectMetadata, ProjectSettings, ReplicationRegistry,
    ReplicationRemote,
};
use revport_importer::status::JobStatus;
use revport_importer::step::ImportStep;
use revport_importer::storage::{CommitRecord, RepoHandle, RepoStorage};
use revport_importer::{ImportError, ImportResult, Job, Progress};

// ---------------------------------------------------------------------------
// Remote host
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeHost {
    pub refs: Vec<RemoteRef>,
    pub branches: Vec<RemoteBranch>,
    pub pull_requests: HashMap<u64, PullRequestInfo>,
    pub pull_request_commits: HashMap<u64, Vec<PullRequestCommit>>,
    /// When set, every lookup fails with this error.
    pub failure: Option<ExternalError>,
}

#[async_trait]
impl CodeHost for FakeHost {
    fn base_url(&self) -> &str {
        "https://host.example"
    }

    fn credentials(&self) -> HostCredentials {
        HostCredentials {
            username: "importer".to_string(),
            token: "token".to_string(),
        }
    }

    async fn repository(
        &self,
        _organisation: &str,
        _repository: &str,
    ) -> Result<RemoteRepositoryInfo, ExternalError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(RemoteRepositoryInfo {
            description: Some("imported repository".to_string()),
            private: false,
            default_branch: "main".to_string(),
        })
    }

    async fn refs(
        &self,
        _organisation: &str,
        _repository: &str,
    ) -> Result<Vec<RemoteRef>, ExternalError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(self.refs.clone())
    }

    async fn branches(
        &self,
        _organisation: &str,
        _repository: &str,
    ) -> Result<Vec<RemoteBranch>, ExternalError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(self.branches.clone())
    }

    async fn pull_request(
        &self,
        _organisation: &str,
        _repository: &str,
        number: u64,
    ) -> Result<PullRequestInfo, ExternalError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        self.pull_requests
            .get(&number)
            .cloned()
            .ok_or_else(|| ExternalError::with_kind("PullRequestNotFound", "no such pull request"))
    }

    async fn pull_request_commits(
        &self,
        _organisation: &str,
        _repository: &str,
        number: u64,
    ) -> Result<Vec<PullRequestCommit>, ExternalError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(self
            .pull_request_commits
            .get(&number)
            .cloned()
            .unwrap_or_default())
    }
}

/// Convenience: pull request #`number` from `base` to `head` on `main`.
pub fn pull_request(number: u64, base_sha: &str, head_sha: &str) -> PullRequestInfo {
    PullRequestInfo {
        number,
        title: "Add widget support".to_string(),
        body: "Adds the widget.\nWith details.".to_string(),
        url: format!("https://host.example/acme/widget/pull/{number}"),
        base: PullRequestSide {
            branch: "main".to_string(),
            sha: base_sha.to_string(),
        },
        head: PullRequestSide {
            branch: "feature".to_string(),
            sha: head_sha.to_string(),
        },
        author: Some(RemoteUser {
            login: "janedev".to_string(),
            name: Some("Jane Developer".to_string()),
            email: Some("jane@host.example".to_string()),
        }),
    }
}

pub fn identity(name: &str) -> GitIdentity {
    GitIdentity {
        name: name.to_string(),
        email: format!("{name}@example.com"),
    }
}

pub fn commit(sha: &str, message: &str) -> CommitRecord {
    CommitRecord {
        sha: sha.to_string(),
        tree: format!("tree-{sha}"),
        parents: vec![format!("parent-{sha}")],
        author: identity("jane"),
        committer: identity("jane"),
        message: message.to_string(),
    }
}

pub fn listed_commit(record: &CommitRecord) -> PullRequestCommit {
    PullRequestCommit {
        sha: record.sha.clone(),
        author: record.author.clone(),
    }
}

// ---------------------------------------------------------------------------
// Repository storage
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeRepo {
    /// Commits returned by `walk_range`, newest first.
    pub walk: Vec<CommitRecord>,
    pub branches: Vec<String>,
    pub fetches: Mutex<Vec<String>>,
}

#[async_trait]
impl RepoHandle for FakeRepo {
    async fn fetch(
        &self,
        _source_uri: &str,
        refspec: &str,
        _credentials: &HostCredentials,
    ) -> Result<(), ExternalError> {
        self.fetches.lock().unwrap().push(refspec.to_string());
        Ok(())
    }

    async fn walk_range(
        &self,
        _base_sha: &str,
        _head_sha: &str,
    ) -> Result<Vec<CommitRecord>, ExternalError> {
        Ok(self.walk.clone())
    }

    async fn branch_exists(&self, branch: &str) -> Result<bool, ExternalError> {
        Ok(self.branches.iter().any(|known| known == branch))
    }
}

pub struct FakeStorage {
    pub repo: Arc<FakeRepo>,
    pub evicted: Mutex<Vec<String>>,
}

impl FakeStorage {
    pub fn new(repo: Arc<FakeRepo>) -> Self {
        Self {
            repo,
            evicted: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RepoStorage for FakeStorage {
    async fn open(&self, _project: &str) -> Result<Arc<dyn RepoHandle>, ExternalError> {
        Ok(self.repo.clone())
    }

    async fn evict(&self, project: &str) {
        self.evicted.lock().unwrap().push(project.to_string());
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeAccounts {
    inner: Mutex<AccountState>,
}

#[derive(Default)]
struct AccountState {
    next_id: AccountId,
    by_login: HashMap<String, AccountId>,
    imported: Vec<String>,
}

impl FakeAccounts {
    pub fn with_account(login: &str, id: AccountId) -> Self {
        let accounts = Self::default();
        {
            let mut state = accounts.inner.lock().unwrap();
            state.by_login.insert(login.to_string(), id);
            state.next_id = id;
        }
        accounts
    }

    pub fn imported_logins(&self) -> Vec<String> {
        self.inner.lock().unwrap().imported.clone()
    }
}

#[async_trait]
impl AccountDirectory for FakeAccounts {
    async fn find_by_external_login(
        &self,
        login: &str,
    ) -> Result<Option<AccountId>, ExternalError> {
        Ok(self.inner.lock().unwrap().by_login.get(login).copied())
    }

    async fn import_account(
        &self,
        login: &str,
        _name: &str,
        _email: &str,
    ) -> Result<AccountId, ExternalError> {
        let mut state = self.inner.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.by_login.insert(login.to_string(), id);
        state.imported.push(login.to_string());
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Change store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeChangeStore {
    inner: Mutex<ChangeState>,
}

#[derive(Default)]
struct ChangeState {
    next_change: u64,
    patch_sets_by_revision: HashMap<String, PatchSetRef>,
    changes_by_key: HashMap<(String, String, String), Vec<ChangeId>>,
    patch_counts: HashMap<ChangeId, u32>,
    inserted_changes: Vec<NewChange>,
    inserted_patch_sets: Vec<(ChangeId, NewPatchSet)>,
}

impl FakeChangeStore {
    /// Pre-seed an already-imported revision.
    pub fn seed_patch_set(&self, sha: &str, change: ChangeId, number: u32) {
        let mut state = self.inner.lock().unwrap();
        state
            .patch_sets_by_revision
            .insert(sha.to_string(), PatchSetRef { change, number });
    }

    /// Pre-seed a change under a correlation key.
    pub fn seed_change(&self, project: &str, branch: &str, key: &str, change: ChangeId) {
        let mut state = self.inner.lock().unwrap();
        state
            .changes_by_key
            .entry((project.to_string(), branch.to_string(), key.to_string()))
            .or_default()
            .push(change);
        state.next_change = state.next_change.max(change.0);
        state.patch_counts.insert(change, 1);
    }

    pub fn inserted_change_shas(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .inserted_changes
            .iter()
            .map(|change| change.commit_sha.clone())
            .collect()
    }

    pub fn inserted_changes(&self) -> Vec<NewChange> {
        self.inner.lock().unwrap().inserted_changes.clone()
    }

    pub fn inserted_patch_sets(&self) -> Vec<(ChangeId, NewPatchSet)> {
        self.inner.lock().unwrap().inserted_patch_sets.clone()
    }
}

#[async_trait]
impl ChangeStore for FakeChangeStore {
    async fn find_patch_set_by_revision(
        &self,
        sha: &str,
    ) -> Result<Option<PatchSetRef>, ExternalError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .patch_sets_by_revision
            .get(sha)
            .copied())
    }

    async fn find_changes_by_key(
        &self,
        project: &str,
        branch: &str,
        key: &revport_core::change::ChangeKey,
    ) -> Result<Vec<ChangeId>, ExternalError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .changes_by_key
            .get(&(
                project.to_string(),
                branch.to_string(),
                key.as_str().to_string(),
            ))
            .cloned()
            .unwrap_or_default())
    }

    async fn insert_change(&self, change: NewChange) -> Result<ChangeId, ExternalError> {
        let mut state = self.inner.lock().unwrap();
        state.next_change += 1;
        let id = ChangeId(state.next_change);
        state
            .changes_by_key
            .entry((
                change.project.clone(),
                change.branch.clone(),
                change.key.as_str().to_string(),
            ))
            .or_default()
            .push(id);
        state
            .patch_sets_by_revision
            .insert(change.commit_sha.clone(), PatchSetRef { change: id, number: 1 });
        state.patch_counts.insert(id, 1);
        state.inserted_changes.push(change);
        Ok(id)
    }

    async fn insert_patch_set(
        &self,
        change: ChangeId,
        patch_set: NewPatchSet,
    ) -> Result<PatchSetRef, ExternalError> {
        let mut state = self.inner.lock().unwrap();
        let number = state.patch_counts.entry(change).or_insert(0);
        *number += 1;
        let reference = PatchSetRef {
            change,
            number: *number,
        };
        state
            .patch_sets_by_revision
            .insert(patch_set.commit_sha.clone(), reference);
        state.inserted_patch_sets.push((change, patch_set));
        Ok(reference)
    }
}

// ---------------------------------------------------------------------------
// Project metadata and replication
// ---------------------------------------------------------------------------

/// One committed metadata update, as observed by the fake store.
#[derive(Clone)]
pub struct CommittedMetadata {
    pub project: String,
    pub settings: Option<ProjectSettings>,
    pub rules: Vec<AccessRule>,
    pub message: String,
}

#[derive(Default)]
pub struct FakeMetadata {
    pub committed: Arc<Mutex<Vec<CommittedMetadata>>>,
}

struct FakeTransaction {
    project: String,
    settings: Option<ProjectSettings>,
    rules: Vec<AccessRule>,
    committed: Arc<Mutex<Vec<CommittedMetadata>>>,
}

#[async_trait]
impl MetadataTransaction for FakeTransaction {
    fn set_settings(&mut self, settings: ProjectSettings) {
        self.settings = Some(settings);
    }

    fn grant(&mut self, rule: AccessRule) {
        self.rules.push(rule);
    }

    async fn commit(self: Box<Self>, message: &str) -> Result<(), ExternalError> {
        self.committed.lock().unwrap().push(CommittedMetadata {
            project: self.project,
            settings: self.settings,
            rules: self.rules,
            message: message.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl ProjectMetadata for FakeMetadata {
    async fn begin(
        &self,
        project: &str,
    ) -> Result<Box<dyn MetadataTransaction>, ExternalError> {
        Ok(Box::new(FakeTransaction {
            project: project.to_string(),
            settings: None,
            rules: Vec::new(),
            committed: self.committed.clone(),
        }))
    }
}

impl FakeMetadata {
    pub fn committed(&self) -> Vec<CommittedMetadata> {
        self.committed.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct FakeReplication {
    pub remotes: Mutex<HashMap<String, ReplicationRemote>>,
}

#[async_trait]
impl ReplicationRegistry for FakeReplication {
    async fn remote(&self, name: &str) -> Result<Option<ReplicationRemote>, ExternalError> {
        Ok(self.remotes.lock().unwrap().get(name).cloned())
    }

    async fn update(&self, remote: ReplicationRemote) -> Result<(), ExternalError> {
        self.remotes
            .lock()
            .unwrap()
            .insert(remote.name.clone(), remote);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pipeline instrumentation
// ---------------------------------------------------------------------------

/// A step that records its invocations and optionally fails.
pub struct RecordingStep {
    label: &'static str,
    fail: bool,
    pub imports: AtomicU32,
    pub rollbacks: AtomicU32,
}

impl RecordingStep {
    pub fn succeeding(label: &'static str) -> Arc<Self> {
        Arc::new(Self {
            label,
            fail: false,
            imports: AtomicU32::new(0),
            rollbacks: AtomicU32::new(0),
        })
    }

    pub fn failing(label: &'static str) -> Arc<Self> {
        Arc::new(Self {
            label,
            fail: true,
            imports: AtomicU32::new(0),
            rollbacks: AtomicU32::new(0),
        })
    }

    pub fn import_count(&self) -> u32 {
        self.imports.load(Ordering::SeqCst)
    }

    pub fn rollback_count(&self) -> u32 {
        self.rollbacks.load(Ordering::SeqCst)
    }
}

/// Wrapper so one `Arc<RecordingStep>` can be observed after the pipeline
/// consumed the boxed step.
pub struct SharedStep(pub Arc<RecordingStep>);

#[async_trait]
impl ImportStep for SharedStep {
    fn label(&self) -> &'static str {
        self.0.label
    }

    async fn do_import(&self, _progress: &Progress) -> ImportResult<()> {
        self.0.imports.fetch_add(1, Ordering::SeqCst);
        if self.0.fail {
            Err(ImportError::External(ExternalError::with_kind(
                "StepBlewUp",
                "simulated failure",
            )))
        } else {
            Ok(())
        }
    }

    async fn rollback(&self) -> bool {
        // First rollback reverts, later ones find nothing to undo.
        self.0.rollbacks.fetch_add(1, Ordering::SeqCst) == 0 && self.0.import_count() > 0
    }
}

/// Poll a job until it leaves the running state.
///
/// Scheduled jobs run on their own tasks; scenario tests wait for the
/// terminal status instead of racing it.
pub async fn wait_until_terminal(job: &Arc<dyn Job>) {
    for _ in 0..500 {
        if job.status().code().await.is_terminal() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} never reached a terminal state", job.index());
}

/// A job that only counts cancel requests and waits until cancelled.
pub struct CountingJob {
    index: u32,
    status: JobStatus,
    pub cancels: AtomicU32,
}

impl CountingJob {
    pub fn new(index: u32) -> Arc<Self> {
        Arc::new(Self {
            index,
            status: JobStatus::new(index),
            cancels: AtomicU32::new(0),
        })
    }

    pub fn cancel_count(&self) -> u32 {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Job for CountingJob {
    fn index(&self) -> u32 {
        self.index
    }

    fn organisation(&self) -> &str {
        "acme"
    }

    fn repository(&self) -> &str {
        "widget"
    }

    fn status(&self) -> &JobStatus {
        &self.status
    }

    async fn run(&self) {
        // Simulates a long import; real jobs fold cancellation into their
        // status the same way.
        tokio::time::sleep(Duration::from_secs(3600)).await;
    }

    async fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

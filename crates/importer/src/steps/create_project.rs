//! Creates the destination project record: settings and the default
//! access rules for the importing user, in one metadata transaction.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ImporterConfig;
use crate::error::ImportResult;
use crate::progress::Progress;
use crate::review::{
    AccessRule, InheritableFlag, Permission, ProjectMetadata, ProjectSettings, SubmitType,
};
use crate::step::ImportStep;

const ALL_REFS: &str = "refs/*";
const CODE_REVIEW_REFS: &str = "refs/for/refs/*";
const HEADS_REFS: &str = "refs/heads/*";
const TAGS_REFS: &str = "refs/tags/*";

const CODE_REVIEW_LABEL: &str = "Code-Review";
const VERIFIED_LABEL: &str = "Verified";

pub struct CreateProjectStep {
    project: String,
    description: Option<String>,
    username: String,
    source_uri: String,
    metadata: Arc<dyn ProjectMetadata>,
}

impl CreateProjectStep {
    pub fn new(
        metadata: Arc<dyn ProjectMetadata>,
        organisation: &str,
        repository: &str,
        description: Option<String>,
        username: impl Into<String>,
        source_uri: impl Into<String>,
    ) -> Self {
        Self {
            project: ImporterConfig::project_name(organisation, repository),
            description,
            username: username.into(),
            source_uri: source_uri.into(),
            metadata,
        }
    }
}

/// Default permissions for a freshly imported project: the importing user
/// owns it outright and can drive the whole review flow on it.
pub fn default_access_rules(username: &str) -> Vec<AccessRule> {
    let group = format!("user:{username}");
    let plain = |ref_pattern: &str, permission: Permission| AccessRule {
        ref_pattern: ref_pattern.to_string(),
        permission,
        group: group.clone(),
        range: None,
        force: false,
    };

    let mut rules = vec![plain(ALL_REFS, Permission::Owner)];

    for permission in [
        Permission::Read,
        Permission::Push,
        Permission::RemoveReviewer,
        Permission::Submit,
        Permission::Rebase,
    ] {
        rules.push(plain(CODE_REVIEW_REFS, permission));
    }
    rules.push(AccessRule {
        ref_pattern: CODE_REVIEW_REFS.to_string(),
        permission: Permission::Label(CODE_REVIEW_LABEL.to_string()),
        group: group.clone(),
        range: Some((-2, 2)),
        force: false,
    });
    rules.push(AccessRule {
        ref_pattern: CODE_REVIEW_REFS.to_string(),
        permission: Permission::Label(VERIFIED_LABEL.to_string()),
        group: group.clone(),
        range: Some((-1, 1)),
        force: false,
    });

    for permission in [Permission::Read, Permission::Create, Permission::PushMerge] {
        rules.push(plain(HEADS_REFS, permission));
    }
    rules.push(AccessRule {
        ref_pattern: HEADS_REFS.to_string(),
        permission: Permission::Push,
        group: group.clone(),
        range: None,
        force: true,
    });

    rules.push(plain(TAGS_REFS, Permission::Push));
    rules.push(AccessRule {
        ref_pattern: TAGS_REFS.to_string(),
        permission: Permission::Push,
        group,
        range: None,
        force: true,
    });

    rules
}

#[async_trait]
impl ImportStep for CreateProjectStep {
    fn label(&self) -> &'static str {
        "create-project"
    }

    async fn do_import(&self, progress: &Progress) -> ImportResult<()> {
        tracing::debug!(project = %self.project, "creating review project");
        let mut txn = self.metadata.begin(&self.project).await?;
        progress.begin_task("Configure review project", 2).await;

        txn.set_settings(ProjectSettings {
            description: self.description.clone(),
            submit_type: SubmitType::MergeIfNecessary,
            use_contributor_agreements: InheritableFlag::Inherit,
            use_signed_off_by: InheritableFlag::Inherit,
            use_content_merge: InheritableFlag::Inherit,
            require_change_id: InheritableFlag::Inherit,
        });
        progress.update(1).await;

        for rule in default_access_rules(&self.username) {
            txn.grant(rule);
        }
        progress.update(1).await;

        txn.commit(&format!("Imported from {}", self.source_uri))
            .await?;
        progress.end_task().await;
        Ok(())
    }

    // Deleting a project record is destructive and deliberately not
    // automatic.
    async fn rollback(&self) -> bool {
        false
    }
}

//! Registers the imported project as a replication target pointing back at
//! the source host, reusing the importing user's credentials.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ImporterConfig;
use crate::error::ImportResult;
use crate::hosting::HostCredentials;
use crate::progress::Progress;
use crate::review::{ReplicationRegistry, ReplicationRemote};
use crate::step::ImportStep;

/// Default push refspec replicating every ref back to the source.
const DEFAULT_PUSH_REFSPEC: &str = "refs/*:refs/*";

pub struct ReplicateProjectStep {
    project: String,
    host_url: String,
    credentials: HostCredentials,
    registry: Arc<dyn ReplicationRegistry>,
}

impl ReplicateProjectStep {
    pub fn new(
        registry: Arc<dyn ReplicationRegistry>,
        host_url: impl Into<String>,
        credentials: HostCredentials,
        organisation: &str,
        repository: &str,
    ) -> Self {
        Self {
            project: ImporterConfig::project_name(organisation, repository),
            host_url: host_url.into(),
            credentials,
            registry,
        }
    }
}

/// Merge one more project into the user's replication remote.
///
/// Credentials are always refreshed; url and push refspec keep any value an
/// operator already set and only default when missing.
pub fn build_remote_config(
    existing: Option<ReplicationRemote>,
    host_url: &str,
    credentials: &HostCredentials,
    project: &str,
) -> ReplicationRemote {
    let mut remote = existing.unwrap_or_else(|| ReplicationRemote {
        name: credentials.username.clone(),
        username: credentials.username.clone(),
        password: String::new(),
        url: None,
        push: None,
        projects: Vec::new(),
    });

    remote.username = credentials.username.clone();
    remote.password = credentials.token.clone();
    if remote.url.is_none() {
        remote.url = Some(format!("{host_url}/${{name}}.git"));
    }
    if remote.push.is_none() {
        remote.push = Some(DEFAULT_PUSH_REFSPEC.to_string());
    }
    if !remote.projects.iter().any(|existing| existing == project) {
        remote.projects.push(project.to_string());
    }

    remote
}

#[async_trait]
impl ImportStep for ReplicateProjectStep {
    fn label(&self) -> &'static str {
        "replicate-project"
    }

    async fn do_import(&self, progress: &Progress) -> ImportResult<()> {
        progress.begin_task("Setting up replication", 2).await;

        let existing = self.registry.remote(&self.credentials.username).await?;
        let remote =
            build_remote_config(existing, &self.host_url, &self.credentials, &self.project);
        progress.update(1).await;

        self.registry.update(remote).await?;
        progress.update(1).await;

        progress.end_task().await;
        Ok(())
    }

    // Removing a replication remote is not automatic.
    async fn rollback(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> HostCredentials {
        HostCredentials {
            username: "jane".to_string(),
            token: "secret".to_string(),
        }
    }

    #[test]
    fn fresh_remote_gets_defaults() {
        let remote =
            build_remote_config(None, "https://host.example", &credentials(), "acme/widget");
        assert_eq!(remote.name, "jane");
        assert_eq!(remote.password, "secret");
        assert_eq!(remote.url.as_deref(), Some("https://host.example/${name}.git"));
        assert_eq!(remote.push.as_deref(), Some(DEFAULT_PUSH_REFSPEC));
        assert_eq!(remote.projects, vec!["acme/widget"]);
    }

    #[test]
    fn operator_settings_are_preserved() {
        let existing = ReplicationRemote {
            name: "jane".to_string(),
            username: "jane".to_string(),
            password: "stale".to_string(),
            url: Some("ssh://mirror/${name}".to_string()),
            push: Some("+refs/heads/*:refs/heads/*".to_string()),
            projects: vec!["acme/older".to_string()],
        };
        let remote = build_remote_config(
            Some(existing),
            "https://host.example",
            &credentials(),
            "acme/widget",
        );
        assert_eq!(remote.url.as_deref(), Some("ssh://mirror/${name}"));
        assert_eq!(remote.push.as_deref(), Some("+refs/heads/*:refs/heads/*"));
        // Credentials are refreshed even on an existing remote.
        assert_eq!(remote.password, "secret");
        assert_eq!(remote.projects, vec!["acme/older", "acme/widget"]);
    }

    #[test]
    fn re_adding_a_project_does_not_duplicate_it() {
        let first =
            build_remote_config(None, "https://host.example", &credentials(), "acme/widget");
        let second = build_remote_config(
            Some(first),
            "https://host.example",
            &credentials(),
            "acme/widget",
        );
        assert_eq!(second.projects, vec!["acme/widget"]);
    }
}

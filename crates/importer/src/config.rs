//! Importer configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for one importer instance.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ImporterConfig {
    /// Base URL of the source hosting service, no trailing slash.
    pub host_url: String,
    /// Directory holding the destination git repositories.
    pub git_dir: PathBuf,
    /// Maximum number of jobs executing concurrently.
    pub job_pool_limit: usize,
    /// Upper bound of the randomized job start delay.
    pub job_start_delay_max: Duration,
    /// Skip the protected-branches validation step.
    pub ignore_branch_protection: bool,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            host_url: "https://github.com".to_string(),
            git_dir: PathBuf::from("data/git"),
            job_pool_limit: 5,
            job_start_delay_max: Duration::from_secs(10),
            ignore_branch_protection: false,
        }
    }
}

impl ImporterConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default              |
    /// |----------------------------|----------------------|
    /// | `IMPORT_HOST_URL`          | `https://github.com` |
    /// | `IMPORT_GIT_DIR`           | `data/git`           |
    /// | `IMPORT_JOB_POOL_LIMIT`    | `5`                  |
    /// | `IMPORT_JOB_DELAY_MAX_SECS`| `10`                 |
    /// | `IMPORT_IGNORE_BRANCH_PROTECTION` | `false`       |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host_url = std::env::var("IMPORT_HOST_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.host_url);

        let git_dir = std::env::var("IMPORT_GIT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.git_dir);

        let job_pool_limit: usize = std::env::var("IMPORT_JOB_POOL_LIMIT")
            .unwrap_or_else(|_| defaults.job_pool_limit.to_string())
            .parse()
            .expect("IMPORT_JOB_POOL_LIMIT must be a valid usize");

        let delay_secs: u64 = std::env::var("IMPORT_JOB_DELAY_MAX_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("IMPORT_JOB_DELAY_MAX_SECS must be a valid u64");

        let ignore_branch_protection = std::env::var("IMPORT_IGNORE_BRANCH_PROTECTION")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            host_url,
            git_dir,
            job_pool_limit,
            job_start_delay_max: Duration::from_secs(delay_secs),
            ignore_branch_protection,
        }
    }

    /// Project name in the destination system.
    pub fn project_name(organisation: &str, repository: &str) -> String {
        format!("{organisation}/{repository}")
    }

    /// On-disk path of the destination repository.
    pub fn destination_path(&self, organisation: &str, repository: &str) -> PathBuf {
        self.git_dir
            .join(organisation)
            .join(format!("{repository}.git"))
    }
}

//! Author identity resolution for imported commits.
//!
//! The remote host's user record is the preferred source of truth; when it is
//! unavailable or incomplete the raw git author identity fills the gaps, and
//! a login is generated from the author name as a last resort.

use serde::{Deserialize, Serialize};

/// Raw git author/committer identity as recorded in a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitIdentity {
    pub name: String,
    pub email: String,
}

impl std::fmt::Display for GitIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// A user record from the remote hosting service. Name and email are
/// optional because the service only exposes what the user made public.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUser {
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Resolved identity used to look up or create a local account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorIdentity {
    pub login: String,
    pub name: String,
    pub email: String,
}

impl AuthorIdentity {
    /// Merge the remote user record with the raw git identity.
    pub fn resolve(remote: Option<&RemoteUser>, git_author: &GitIdentity) -> Self {
        let login = remote
            .map(|user| user.login.clone())
            .filter(|login| !login.is_empty())
            .unwrap_or_else(|| generate_login(&git_author.name));
        let name = remote
            .and_then(|user| user.name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| git_author.name.clone());
        let email = remote
            .and_then(|user| user.email.clone())
            .filter(|email| !email.is_empty())
            .unwrap_or_else(|| git_author.email.clone());
        Self { login, name, email }
    }
}

/// Derive a login from a free-form author name: lower-cased, with every
/// character outside `[a-z0-9]` replaced by an underscore.
pub fn generate_login(full_name: &str) -> String {
    full_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

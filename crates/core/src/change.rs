//! Change correlation keys and the messages attached to imported changes.
//!
//! A correlation key decides whether an imported commit updates an existing
//! change or creates a new one. Commits that already carry a `Change-Id`
//! trailer keep it; everything else gets a key computed deterministically
//! from the commit content, so re-importing unchanged history lands on the
//! same change.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::identity::GitIdentity;

/// Hex length of a change key, excluding the `I` prefix.
const KEY_HEX_LEN: usize = 40;

/// Correlation key for a change: `I` followed by 40 hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeKey(String);

impl ChangeKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChangeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn trailer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^Change-Id:\s*(I[0-9a-fA-F]{40})\s*$").expect("valid trailer pattern")
    })
}

/// Extract the change key from a commit message's `Change-Id` trailer.
///
/// When a message carries several trailers the last one wins, matching the
/// convention used by commit-message hooks that append rather than replace.
pub fn key_from_message(message: &str) -> Option<ChangeKey> {
    trailer_pattern()
        .captures_iter(message)
        .last()
        .map(|captures| ChangeKey(captures[1].to_string()))
}

/// Compute a change key from commit content.
///
/// The digest covers the tree id, every parent id, the author and committer
/// identities, and the message, so content that has not diverged always maps
/// back to the same key.
pub fn computed_key(
    tree: &str,
    parents: &[String],
    author: &GitIdentity,
    committer: &GitIdentity,
    message: &str,
) -> ChangeKey {
    let mut hasher = Sha256::new();
    hasher.update(b"tree ");
    hasher.update(tree.as_bytes());
    hasher.update(b"\n");
    for parent in parents {
        hasher.update(b"parent ");
        hasher.update(parent.as_bytes());
        hasher.update(b"\n");
    }
    hasher.update(b"author ");
    hasher.update(author.to_string().as_bytes());
    hasher.update(b"\n");
    hasher.update(b"committer ");
    hasher.update(committer.to_string().as_bytes());
    hasher.update(b"\n\n");
    hasher.update(message.as_bytes());

    let digest = hasher.finalize();
    let hex = format!("{digest:x}");
    ChangeKey(format!("I{}", &hex[..KEY_HEX_LEN]))
}

/// Topic applied to every change created from one pull request, so the
/// review UI groups them together.
pub fn topic_for_pull_request(number: u64) -> String {
    format!("PullRequest #{number}")
}

/// Message recorded on changes created from a pull request: source link,
/// title, and the body with paragraph breaks preserved.
pub fn change_message(url: &str, title: &str, body: &str) -> String {
    format!(
        "Pull Request: {url}\n\n{title}\n\n{}",
        body.replace('\n', "\n\n")
    )
}

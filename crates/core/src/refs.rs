//! Classification of ref names reserved by the destination review system,
//! and the refspecs used when mirroring a source repository.
//!
//! A source repository that already contains refs under these namespaces
//! cannot be imported: the destination would either hide them or treat them
//! as review-system metadata.

/// Prefixes of magic push targets: pushing to these triggers review-system
/// behavior instead of a plain ref update.
pub const MAGIC_REF_PREFIXES: &[&str] = &["refs/for/", "refs/drafts/"];

/// Prefixes of namespaces managed by the review system itself.
pub const REVIEW_MANAGED_PREFIXES: &[&str] = &[
    "refs/changes/",
    "refs/meta/",
    "refs/users/",
    "refs/cache-automerge/",
    "refs/starred-changes/",
    "refs/sequences/",
];

/// Prefix of the metadata namespace.
pub const META_REF_PREFIX: &str = "refs/meta/";

/// Refspec used when mirroring a source repository into the destination.
pub const CLONE_REFSPEC: &str = "+refs/*:refs/*";

/// Returns `true` for magic push target names.
pub fn is_magic_ref(name: &str) -> bool {
    MAGIC_REF_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// Returns `true` for refs inside a review-system-managed namespace.
pub fn is_review_managed_ref(name: &str) -> bool {
    REVIEW_MANAGED_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// Returns `true` for refs inside the metadata namespace.
pub fn is_meta_ref(name: &str) -> bool {
    name.starts_with(META_REF_PREFIX)
}

/// Synthetic local ref tracking one pull request's head, scoped so it cannot
/// collide with the repository's own namespaces.
pub fn pull_request_ref(number: u64) -> String {
    format!("refs/remotes/origin/pr/{number}")
}

/// Refspec fetching one pull request's head into its synthetic local ref.
pub fn pull_request_refspec(number: u64) -> String {
    format!("+refs/pull/{number}/head:{}", pull_request_ref(number))
}

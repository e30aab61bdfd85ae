//! Repository state classification
//!
//! Clean/dirty detection and the local/remote divergence classification.

use crate::error::{Error, Result};
use crate::git::RepositoryHandle;
use tracing::debug;

/// Relationship between a local branch and its remote counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divergence {
    /// Local and remote point at the same commit
    UpToDate,
    /// Remote is strictly ahead
    NeedToPull,
    /// Local is strictly ahead
    NeedToPush,
    /// Both have commits the other lacks
    Diverged,
}

impl Divergence {
    /// Classify a (local, remote, merge-base) commit triple.
    ///
    /// The checks run in a fixed order: equality first, then the two
    /// single-sided cases, then the catch-all.
    pub fn from_commits(local: &str, remote: &str, base: &str) -> Self {
        if local == remote {
            Self::UpToDate
        } else if local == base {
            Self::NeedToPull
        } else if remote == base {
            Self::NeedToPush
        } else {
            Self::Diverged
        }
    }
}

impl std::fmt::Display for Divergence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UpToDate => write!(f, "up-to-date"),
            Self::NeedToPull => write!(f, "need-to-pull"),
            Self::NeedToPush => write!(f, "need-to-push"),
            Self::Diverged => write!(f, "diverged"),
        }
    }
}

/// True iff tracked files have no changes against `HEAD`
pub fn is_working_tree_clean(repo: &RepositoryHandle) -> Result<bool> {
    let changed = repo.git(&["diff", "--name-only", "HEAD"])?;
    Ok(changed.trim().is_empty())
}

/// Compare `local_ref` against `<remote>/<remote_branch>`.
///
/// Refreshes remote tracking refs first.
pub fn classify_divergence(
    repo: &RepositoryHandle,
    local_ref: &str,
    remote_branch: &str,
) -> Result<Divergence> {
    repo.update_remote_refs()?;

    let remote_ref = repo.remote_ref(remote_branch);
    let local = repo.rev_parse(local_ref)?;
    let remote = repo.rev_parse(&remote_ref)?;
    let base = repo.merge_base(local_ref, &remote_ref)?;

    let divergence = Divergence::from_commits(&local, &remote, &base);
    debug!(local_ref, %remote_ref, %divergence, "classified divergence");
    Ok(divergence)
}

/// True iff `rev` has no commits missing from `<remote>/<default>`
pub fn is_branch_merged_upstream(repo: &RepositoryHandle, rev: &str) -> Result<bool> {
    repo.update_remote_refs()?;

    let upstream = repo.remote_ref(&repo.default_branch()?);
    let tip = repo.rev_parse(rev)?;
    let base = repo.merge_base(&tip, &upstream)?;
    Ok(tip == base)
}

/// True iff `sha` is already an ancestor of `<remote>/<branch>`.
///
/// `sha` may be abbreviated. An unknown commit or a failing merge-base lookup
/// (missing branch) means "not on the remote" rather than an error.
pub fn is_commit_on_remote(
    repo: &RepositoryHandle,
    sha: Option<&str>,
    branch: &str,
) -> Result<bool> {
    let sha = sha
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Validation("a commit sha must be provided".to_string()))?;

    let commit = match repo.rev_parse(&format!("{sha}^{{commit}}")) {
        Ok(commit) => commit,
        Err(e) => {
            debug!(sha, error = %e, "unknown commit");
            return Ok(false);
        }
    };

    let remote_ref = repo.remote_ref(branch);
    match repo.merge_base(&commit, &remote_ref) {
        Ok(base) => Ok(base == commit),
        Err(e) => {
            debug!(sha, %remote_ref, error = %e, "merge-base lookup failed");
            Ok(false)
        }
    }
}

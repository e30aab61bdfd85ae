//! Disposable trial merges
//!
//! Answers "would `target` merge cleanly into `source`" by merging copies of
//! the two remote branches on throwaway local branches. The working tree is
//! put back exactly as it was found: original branch, stashed changes, and no
//! `tmp_*` branches left behind.

use crate::error::{Error, Result};
use crate::git::RepositoryHandle;
use crate::git::state::is_working_tree_clean;
use tracing::debug;

/// Prefix of the throwaway branches
pub const TEMP_BRANCH_PREFIX: &str = "tmp_";

// The trial merge commit is thrown away, so it never needs the user's identity.
const MERGE_IDENTITY: [&str; 4] = [
    "-c",
    "user.name=patchflow",
    "-c",
    "user.email=patchflow@localhost",
];

/// Name of the throwaway copy of `branch`
pub fn temp_branch_name(branch: &str) -> String {
    format!("{TEMP_BRANCH_PREFIX}{branch}")
}

/// Where `HEAD` was before the probe started
enum Position {
    Branch(String),
    Detached(String),
}

impl Position {
    fn capture(repo: &RepositoryHandle) -> Result<Self> {
        let branch = repo.current_branch()?;
        if branch == "HEAD" {
            Ok(Self::Detached(repo.head_sha()?))
        } else {
            Ok(Self::Branch(branch))
        }
    }

    fn target(&self) -> &str {
        match self {
            Self::Branch(name) | Self::Detached(name) => name,
        }
    }
}

/// Trial-merge `<remote>/<target>` into `<remote>/<source>`.
///
/// Returns `Ok(false)` when the merge conflicts. Errors are reserved for git
/// failures outside the merge itself, including failures while restoring the
/// working tree.
pub fn probe_mergeable(repo: &RepositoryHandle, source: &str, target: &str) -> Result<bool> {
    if source == target {
        return Err(Error::Validation(format!(
            "source and target branch are both '{source}'"
        )));
    }

    let original = Position::capture(repo)?;
    let stashed = if is_working_tree_clean(repo)? {
        false
    } else {
        debug!("stashing local changes before trial merge");
        repo.git(&["stash"])?;
        true
    };

    let mut created = Vec::new();
    let outcome = trial_merge(repo, source, target, &mut created);
    let restored = restore(repo, &original, stashed, &created);

    match (outcome, restored) {
        (_, Err(e)) | (Err(e), Ok(())) => Err(e),
        (Ok(clean), Ok(())) => {
            debug!(source, target, clean, "trial merge finished");
            Ok(clean)
        }
    }
}

fn trial_merge(
    repo: &RepositoryHandle,
    source: &str,
    target: &str,
    created: &mut Vec<String>,
) -> Result<bool> {
    repo.fetch()?;

    let tmp_source = temp_branch_name(source);
    let tmp_target = temp_branch_name(target);

    for (tmp, branch) in [(&tmp_source, source), (&tmp_target, target)] {
        if repo.branch_exists(tmp)? {
            debug!(branch = %tmp, "removing stale temporary branch");
            repo.delete_branch(tmp)?;
        }
        repo.git(&["branch", "--track", tmp, &repo.remote_ref(branch)])?;
        created.push(tmp.clone());
    }

    repo.checkout(&tmp_source)?;

    let mut args: Vec<&str> = MERGE_IDENTITY.iter().copied().collect();
    args.extend(["merge", "--no-edit", tmp_target.as_str()]);
    let merge = repo.git_output(&args)?;
    if !merge.success {
        debug!(
            stdout = %merge.stdout.trim(),
            stderr = %merge.stderr.trim(),
            "trial merge conflicted"
        );
    }
    Ok(merge.success)
}

fn restore(
    repo: &RepositoryHandle,
    original: &Position,
    stashed: bool,
    created: &[String],
) -> Result<()> {
    let mut first_error = None;

    if merge_in_progress(repo) {
        keep_first(&mut first_error, repo.git(&["merge", "--abort"]).map(drop));
    }
    keep_first(&mut first_error, repo.checkout(original.target()));
    if stashed {
        keep_first(&mut first_error, repo.git(&["stash", "pop"]).map(drop));
    }
    for branch in created {
        keep_first(&mut first_error, repo.delete_branch(branch));
    }

    first_error.map_or(Ok(()), Err)
}

fn merge_in_progress(repo: &RepositoryHandle) -> bool {
    repo.git_output(&["rev-parse", "-q", "--verify", "MERGE_HEAD"])
        .is_ok_and(|out| out.success)
}

/// Record `result` in `slot` unless an earlier error is already there
pub(super) fn keep_first(slot: &mut Option<Error>, result: Result<()>) {
    if let Err(e) = result {
        slot.get_or_insert(e);
    }
}

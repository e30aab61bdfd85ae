//! Repository housekeeping: status summaries, default-branch sync, pruning,
//! branch switching

use crate::error::Result;
use crate::git::probe::keep_first;
use crate::git::repo::{BranchSwitch, RepositoryHandle};
use crate::git::state::{
    Divergence, classify_divergence, is_branch_merged_upstream, is_working_tree_clean,
};
use crate::report::Report;
use tracing::debug;

/// One-line summary of a repository
#[derive(Debug, Clone)]
pub struct RepoStatus {
    /// Working tree root
    pub path: String,
    /// Checked out branch
    pub branch: String,
    /// Whether tracked files are unchanged
    pub clean: bool,
    /// First line of `git status -s` when dirty
    pub changes: Option<String>,
    /// Local default branch against the remote default branch
    pub divergence: Divergence,
    /// For non-default branches: whether everything is merged upstream
    pub merged: Option<bool>,
    /// All local branches
    pub branches: Vec<String>,
}

/// Collect a [`RepoStatus`]
pub fn repo_status(repo: &RepositoryHandle) -> Result<RepoStatus> {
    let branch = repo.current_branch()?;
    let default_branch = repo.default_branch()?;
    let clean = is_working_tree_clean(repo)?;
    let changes = if clean {
        None
    } else {
        repo.short_status()?.lines().next().map(ToString::to_string)
    };
    let divergence = classify_divergence(repo, &default_branch, &default_branch)?;
    let merged = if branch == default_branch {
        None
    } else {
        Some(is_branch_merged_upstream(repo, "HEAD")?)
    };

    Ok(RepoStatus {
        path: repo.root().display().to_string(),
        branch,
        clean,
        changes,
        divergence,
        merged,
        branches: repo.local_branches()?,
    })
}

/// Fast-forward the local default branch when the remote is ahead.
///
/// Dirty trees are skipped. When another branch is checked out it is
/// restored afterwards, even if syncing failed; the first error is returned.
/// A failed fast-forward is reported, not raised.
pub fn sync_default_branch(repo: &RepositoryHandle) -> Result<Report> {
    let mut report = Report::new();
    report.info(format!("Checking {}", repo.root().display()));

    if !is_working_tree_clean(repo)? {
        report.warn("Uncommitted changes, skipping");
        return Ok(report);
    }

    let branch = repo.current_branch()?;
    let default_branch = repo.default_branch()?;
    if branch == default_branch {
        fast_forward(repo, &default_branch, &mut report)?;
        return Ok(report);
    }

    report.info(format!("Checking out {default_branch}"));
    repo.checkout(&default_branch)?;

    let mut first_error = None;
    keep_first(&mut first_error, fast_forward(repo, &default_branch, &mut report));
    report.info(format!("Switching back to {branch}"));
    keep_first(&mut first_error, repo.checkout(&branch));

    first_error.map_or(Ok(report), Err)
}

fn fast_forward(repo: &RepositoryHandle, default_branch: &str, report: &mut Report) -> Result<()> {
    let divergence = classify_divergence(repo, default_branch, default_branch)?;
    if divergence != Divergence::NeedToPull {
        debug!(%divergence, "nothing to fast-forward");
        report.info(format!("{default_branch} is {divergence}, nothing to merge"));
        return Ok(());
    }

    let upstream = repo.remote_ref(default_branch);
    report.info(format!("Fast-forwarding {default_branch} to {upstream}"));
    repo.fetch()?;
    match repo.git(&["merge", "--ff-only", &upstream]) {
        Ok(_) => report.success("Merge complete"),
        Err(e) => report.warn(format!("Merge failed: {e}")),
    }
    Ok(())
}

/// Remove stale remote tracking refs
pub fn prune_remote(repo: &RepositoryHandle) -> Result<Report> {
    let mut report = Report::new();
    let output = repo.git(&["remote", "prune", repo.remote()])?;
    let output = output.trim();
    if output.is_empty() {
        report.info("Nothing to prune");
    } else {
        report.success(output);
    }
    Ok(report)
}

/// Diff of the local default branch against the remote one
pub fn remote_diff(repo: &RepositoryHandle) -> Result<Report> {
    let mut report = Report::new();
    if !is_working_tree_clean(repo)? {
        report.warn("Uncommitted changes are not part of this diff");
    }

    repo.fetch()?;
    let default_branch = repo.default_branch()?;
    let upstream = repo.remote_ref(&default_branch);
    let diff = repo.git(&["diff", &default_branch, &upstream])?;
    if diff.trim().is_empty() {
        report.info("No diffs found");
    } else {
        report.info(diff.trim_end());
    }
    Ok(report)
}

/// List local branches, or switch to `name` creating it from the remote
/// default branch when it does not exist
pub fn change_or_create_branch(repo: &RepositoryHandle, name: Option<&str>) -> Result<Report> {
    let mut report = Report::new();
    let Some(name) = name else {
        let current = repo.current_branch()?;
        for branch in repo.local_branches()? {
            let marker = if branch == current { "* " } else { "  " };
            report.info(format!("{marker}{branch}"));
        }
        return Ok(report);
    };

    let upstream = repo.remote_ref(&repo.default_branch()?);
    match repo.switch_or_create_branch(name, &upstream)? {
        BranchSwitch::Created => report.success(format!("Created {name} tracking {upstream}")),
        BranchSwitch::Switched => report.info(format!("Branch exists. Changed into {name}")),
        BranchSwitch::AlreadyOn => report.info(format!("Already on {name}")),
    }
    Ok(report)
}

/// Check out `name`, or the default branch when no name is given
pub fn checkout_branch(repo: &RepositoryHandle, name: Option<&str>) -> Result<Report> {
    let target = match name {
        Some(name) => name.to_string(),
        None => repo.default_branch()?,
    };

    let mut report = Report::new();
    if repo.current_branch()? == target {
        report.info(format!("Already on {target}"));
    } else {
        repo.checkout(&target)?;
        report.info(format!("Switched to {target}"));
    }
    Ok(report)
}

//! Explicit handle to a local git repository
//!
//! Every classifier, prober and workflow operation takes a
//! [`RepositoryHandle`] instead of relying on the process working directory.
//! Only one actor is assumed per working tree: running two patchflow
//! commands against the same checkout at once is unsupported.

use crate::error::{Error, Result};
use crate::git::runner::{CommandOutput, run_git, run_git_output};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default remote name
pub const DEFAULT_REMOTE: &str = "origin";

/// Fallback when neither configuration nor `<remote>/HEAD` names a default branch
pub const FALLBACK_DEFAULT_BRANCH: &str = "master";

/// Outcome of [`RepositoryHandle::switch_or_create_branch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchSwitch {
    /// The branch was created and checked out
    Created,
    /// The branch existed and was checked out
    Switched,
    /// The branch was already checked out
    AlreadyOn,
}

/// A local git working tree plus the settings used to talk to its remote
#[derive(Debug, Clone)]
pub struct RepositoryHandle {
    root: PathBuf,
    remote: String,
    default_branch: Option<String>,
    env: BTreeMap<String, String>,
}

impl RepositoryHandle {
    /// Open the repository containing `path`.
    ///
    /// Fails with [`Error::PreconditionFailed`] when `path` is not inside a
    /// git working tree.
    pub fn open(path: &Path) -> Result<Self> {
        let toplevel = run_git(path, &["rev-parse", "--show-toplevel"], &BTreeMap::new())
            .map_err(|_| {
                Error::PreconditionFailed(format!("Not a git repository: {}", path.display()))
            })?;
        let toplevel = toplevel.trim();
        if toplevel.is_empty() {
            return Err(Error::PreconditionFailed(format!(
                "Not a git repository: {}",
                path.display()
            )));
        }

        Ok(Self {
            root: PathBuf::from(toplevel),
            remote: DEFAULT_REMOTE.to_string(),
            default_branch: None,
            env: BTreeMap::new(),
        })
    }

    /// Use a remote other than `origin`
    #[must_use]
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    /// Pin the default branch instead of asking `<remote>/HEAD`
    #[must_use]
    pub fn with_default_branch(mut self, branch: Option<String>) -> Self {
        self.default_branch = branch;
        self
    }

    /// Route git's HTTPS traffic through `proxy`
    #[must_use]
    pub fn with_proxy(self, proxy: Option<&str>) -> Self {
        match proxy {
            Some(url) => self.with_env("https_proxy", url),
            None => self,
        }
    }

    /// Add an environment override for every git invocation
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Working tree root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Remote name
    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// `<remote>/<branch>`
    pub fn remote_ref(&self, branch: &str) -> String {
        format!("{}/{branch}", self.remote)
    }

    /// Run git and return stdout, failing on nonzero exit with stderr
    pub fn git(&self, args: &[&str]) -> Result<String> {
        run_git(&self.root, args, &self.env)
    }

    /// Run git and return the raw output regardless of exit status
    pub fn git_output(&self, args: &[&str]) -> Result<CommandOutput> {
        run_git_output(&self.root, args, &self.env)
    }

    /// Whether the handle still points at a usable repository
    pub fn is_repository(&self) -> bool {
        self.git_output(&["rev-parse", "--git-dir"])
            .is_ok_and(|out| out.success)
    }

    /// Name of the checked out branch (`HEAD` when detached)
    pub fn current_branch(&self) -> Result<String> {
        Ok(self
            .git(&["rev-parse", "--abbrev-ref", "HEAD"])?
            .trim()
            .to_string())
    }

    /// SHA of `HEAD`
    pub fn head_sha(&self) -> Result<String> {
        self.rev_parse("HEAD")
    }

    /// Resolve a revision to a full SHA
    pub fn rev_parse(&self, rev: &str) -> Result<String> {
        Ok(self.git(&["rev-parse", rev])?.trim().to_string())
    }

    /// Merge-base of two revisions (empty when they share no history)
    pub fn merge_base(&self, a: &str, b: &str) -> Result<String> {
        Ok(self.git(&["merge-base", a, b])?.trim().to_string())
    }

    /// Local branch names
    pub fn local_branches(&self) -> Result<Vec<String>> {
        let out = self.git(&["for-each-ref", "--format=%(refname:short)", "refs/heads/"])?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(ToString::to_string)
            .collect())
    }

    /// Whether a local branch named `name` exists
    pub fn branch_exists(&self, name: &str) -> Result<bool> {
        Ok(self.local_branches()?.iter().any(|b| b == name))
    }

    /// Default branch of the remote.
    ///
    /// Uses the configured override, then `<remote>/HEAD`, then
    /// [`FALLBACK_DEFAULT_BRANCH`].
    pub fn default_branch(&self) -> Result<String> {
        if let Some(ref branch) = self.default_branch {
            return Ok(branch.clone());
        }

        let head_ref = format!("refs/remotes/{}/HEAD", self.remote);
        let out = self.git_output(&["symbolic-ref", "--short", &head_ref])?;
        let prefix = format!("{}/", self.remote);
        if out.success
            && let Some(branch) = out.stdout.trim().strip_prefix(&prefix)
            && !branch.is_empty()
        {
            return Ok(branch.to_string());
        }

        Ok(FALLBACK_DEFAULT_BRANCH.to_string())
    }

    /// Check out an existing branch or commit
    pub fn checkout(&self, target: &str) -> Result<()> {
        self.git(&["checkout", target])?;
        Ok(())
    }

    /// Check out `name`, creating it tracking `upstream` if it does not exist
    pub fn switch_or_create_branch(&self, name: &str, upstream: &str) -> Result<BranchSwitch> {
        if self.current_branch()? == name {
            return Ok(BranchSwitch::AlreadyOn);
        }
        if self.branch_exists(name)? {
            self.checkout(name)?;
            return Ok(BranchSwitch::Switched);
        }
        self.git(&["branch", "--track", name, upstream])?;
        self.checkout(name)?;
        Ok(BranchSwitch::Created)
    }

    /// Delete a local branch, merged or not
    pub fn delete_branch(&self, name: &str) -> Result<()> {
        self.git(&["branch", "-D", name])?;
        Ok(())
    }

    /// Fetch from the remote
    pub fn fetch(&self) -> Result<()> {
        self.git(&["fetch", &self.remote])?;
        Ok(())
    }

    /// Refresh all remote tracking refs
    pub fn update_remote_refs(&self) -> Result<()> {
        self.git(&["remote", "update", &self.remote])?;
        Ok(())
    }

    /// Push `branch` to the remote under the same name
    pub fn push_branch(&self, branch: &str) -> Result<()> {
        self.git(&["push", &self.remote, branch])?;
        Ok(())
    }

    /// Delete `branch` on the remote
    pub fn delete_remote_branch(&self, branch: &str) -> Result<()> {
        self.git(&["push", &self.remote, "--delete", branch])?;
        Ok(())
    }

    /// URL of the remote
    pub fn remote_url(&self) -> Result<String> {
        let key = format!("remote.{}.url", self.remote);
        Ok(self.git(&["config", "--get", &key])?.trim().to_string())
    }

    /// Subject line of the last commit
    pub fn last_commit_subject(&self) -> Result<String> {
        Ok(self
            .git(&["log", "--format=%s", "-n", "1"])?
            .trim()
            .to_string())
    }

    /// `git status -s` output
    pub fn short_status(&self) -> Result<String> {
        Ok(self.git(&["status", "-s"])?.trim_end().to_string())
    }
}

/// Read a global git config value, empty when unset
pub fn global_config(key: &str) -> Result<String> {
    let home = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
    let out = run_git_output(&home, &["config", "--global", "--get", key], &BTreeMap::new())?;
    Ok(out.stdout.trim().to_string())
}

/// Set a global git config value
pub fn set_global_config(key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{key} must not be empty")));
    }
    let home = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
    run_git(&home, &["config", "--global", key, value], &BTreeMap::new())?;
    Ok(())
}

//! Temporary git repositories for integration tests
//!
//! Layout inside one temp dir:
//! - `remote.git`: bare repository standing in for the hosted project
//! - `work`: the clone patchflow operates on
//! - `other`: a second clone used to push "someone else's" commits

#![allow(dead_code)]

use patchflow::git::RepositoryHandle;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A bare remote with two clones
pub struct TempGitRepo {
    dir: TempDir,
    pub remote: PathBuf,
    pub work: PathBuf,
    pub other: PathBuf,
}

/// Run git in `dir`, panicking with stderr on failure
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .output()
        .expect("failed to spawn git");
    assert!(
        output.status.success(),
        "git {} failed in {}: {}",
        args.join(" "),
        dir.display(),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn configure_identity(dir: &Path, name: &str) {
    git(dir, &["config", "user.name", name]);
    git(dir, &["config", "user.email", &format!("{}@example.com", name.to_lowercase())]);
    git(dir, &["config", "commit.gpgsign", "false"]);
}

impl TempGitRepo {
    /// Seed a repository with one commit on `master` and clone it twice
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let seed = dir.path().join("seed");
        fs::create_dir_all(&seed).unwrap();

        git(&seed, &["init", "-q"]);
        git(&seed, &["symbolic-ref", "HEAD", "refs/heads/master"]);
        configure_identity(&seed, "Seed");
        fs::write(seed.join("README"), "line one\nline two\nline three\n").unwrap();
        git(&seed, &["add", "README"]);
        git(&seed, &["commit", "-q", "-m", "initial"]);

        let remote = dir.path().join("remote.git");
        let work = dir.path().join("work");
        let other = dir.path().join("other");
        let root = dir.path().to_path_buf();
        git(&root, &["clone", "-q", "--bare", "seed", "remote.git"]);
        git(&root, &["clone", "-q", "remote.git", "work"]);
        git(&root, &["clone", "-q", "remote.git", "other"]);
        configure_identity(&work, "Worker");
        configure_identity(&other, "Other");

        Self {
            dir,
            remote,
            work,
            other,
        }
    }

    /// Handle on the `work` clone
    pub fn handle(&self) -> RepositoryHandle {
        RepositoryHandle::open(&self.work).expect("work clone is a repository")
    }

    /// Write `file` in `dir` and commit it; returns the new HEAD sha
    pub fn commit_file(&self, dir: &Path, file: &str, content: &str, message: &str) -> String {
        fs::write(dir.join(file), content).unwrap();
        git(dir, &["add", file]);
        git(dir, &["commit", "-q", "-m", message]);
        git(dir, &["rev-parse", "HEAD"])
    }

    /// Commit on `branch` in the `other` clone and push it
    pub fn push_from_other(&self, branch: &str, file: &str, content: &str) -> String {
        if git(&self.other, &["rev-parse", "--abbrev-ref", "HEAD"]) != branch {
            let exists = !git(&self.other, &["branch", "--list", branch]).is_empty();
            if exists {
                git(&self.other, &["checkout", "-q", branch]);
            } else {
                git(&self.other, &["checkout", "-q", "-b", branch, "origin/master"]);
            }
        }
        let sha = self.commit_file(&self.other, file, content, &format!("other: {file}"));
        git(&self.other, &["push", "-q", "origin", branch]);
        sha
    }

    /// Local branch names of the work clone
    pub fn work_branches(&self) -> Vec<String> {
        git(&self.work, &["for-each-ref", "--format=%(refname:short)", "refs/heads/"])
            .lines()
            .map(ToString::to_string)
            .collect()
    }

    /// Branch names of the bare remote
    pub fn remote_branches(&self) -> Vec<String> {
        git(&self.remote, &["for-each-ref", "--format=%(refname:short)", "refs/heads/"])
            .lines()
            .map(ToString::to_string)
            .collect()
    }

    /// Checked out branch of the work clone
    pub fn work_branch(&self) -> String {
        git(&self.work, &["rev-parse", "--abbrev-ref", "HEAD"])
    }

    /// Temp dir root
    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

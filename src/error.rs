//! Error types for patchflow
//!
//! Every failure carries a severity level and the process exit code the CLI
//! should terminate with. The library never prints or exits on its own.

use crate::report::Level;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by the workflow, the git layer and the platform adapters
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed caller input (e.g. a non-integer id)
    #[error("{0}")]
    Validation(String),

    /// Repository or branch is in the wrong state for the operation
    #[error("{0}")]
    PreconditionFailed(String),

    /// Issue, merge request or branch does not exist remotely
    #[error("{0}")]
    NotFound(String),

    /// The current commit is already contained in the remote default branch
    #[error("commit {sha} is already in {branch}")]
    AlreadyMerged {
        /// Commit that was checked
        sha: String,
        /// Remote branch that contains it
        branch: String,
    },

    /// The merge request is not open anymore
    #[error("merge request !{id} is not open (state: {state})")]
    AlreadyClosed {
        /// Merge request iid
        id: u64,
        /// State reported by the platform
        state: String,
    },

    /// A git invocation exited nonzero and wrote to stderr
    #[error("git {command} failed: {stderr}")]
    Command {
        /// Arguments passed to git, space separated
        command: String,
        /// Captured standard error
        stderr: String,
    },

    /// Rebasing onto the default branch conflicted and was aborted
    #[error("rebase of {branch} onto {onto} failed: {message}")]
    RebaseConflict {
        /// Branch that was being rebased
        branch: String,
        /// Upstream it was rebased onto
        onto: String,
        /// Underlying git message
        message: String,
    },

    /// The trial merge of a merge request conflicted
    #[error("merge request !{0} would not merge cleanly")]
    ConflictDetected(u64),

    /// Accepting a merge request left it in an unexpected state
    #[error("merge request !{id} ended in state '{state}'")]
    UnexpectedState {
        /// Merge request iid
        id: u64,
        /// State reported after the accept call
        state: String,
    },

    /// Settings file missing or invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// No usable API token
    #[error("authentication error: {0}")]
    Auth(String),

    /// GitLab API error
    #[error("GitLab API error: {0}")]
    GitLabApi(String),

    /// GitHub API error
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Platform-agnostic API error
    #[error("platform error: {0}")]
    Platform(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (prompt failures and the like)
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<octocrab::Error> for Error {
    fn from(e: octocrab::Error) -> Self {
        Self::GitHubApi(e.to_string())
    }
}

impl Error {
    /// Severity the CLI should present this error with.
    ///
    /// Input and precondition problems are warnings: nothing was touched and
    /// the user only has to fix their invocation or working tree.
    pub const fn level(&self) -> Level {
        match self {
            Self::Validation(_)
            | Self::PreconditionFailed(_)
            | Self::AlreadyMerged { .. }
            | Self::AlreadyClosed { .. } => Level::Warning,
            _ => Level::Failure,
        }
    }

    /// Process exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Command { .. } => 2,
            Self::Config(_) | Self::Auth(_) => 3,
            _ => 1,
        }
    }

    /// Follow-up instructions for errors that need manual intervention
    pub const fn hint(&self) -> Option<&'static str> {
        match self {
            Self::RebaseConflict { .. } => Some(
                "Run 'git pull --rebase' and resolve the conflicts manually.\n\
                 Then run 'git add <file>' and 'git rebase --continue'.\n\
                 Finally run 'patchflow commit-patch' again.",
            ),
            Self::ConflictDetected(_) => {
                Some("The author has to merge the target branch into the source branch first.")
            }
            Self::Config(_) => Some("Run 'patchflow setup' to create a settings file."),
            _ => None,
        }
    }
}

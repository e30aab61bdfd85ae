//! Submission planning - pure functions deciding what `submit_patch` does
//!
//! No I/O happens here. The facts are gathered by the caller, which makes
//! the push and merge request decisions easy to unit test.

use crate::error::{Error, Result};
use crate::git::Divergence;
use crate::types::NewMergeRequest;

/// Everything `submit_patch` needs to know before acting
#[derive(Debug, Clone)]
pub struct SubmissionFacts {
    /// Checked out branch
    pub branch: String,
    /// Default branch of the remote
    pub default_branch: String,
    /// Remote name
    pub remote: String,
    /// Whether `branch` exists on the remote
    pub branch_on_remote: bool,
    /// Local branch vs. its remote copy; only known when it exists remotely
    pub divergence: Option<Divergence>,
    /// Iid of an open merge request for `branch` -> `default_branch`
    pub open_merge_request: Option<u64>,
    /// Subject of the last commit, the fallback title
    pub last_commit_subject: String,
}

/// How local commits reach the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushAction {
    /// New remote branch: rebase onto `onto` first, then push
    RebaseAndPush {
        /// `<remote>/<default>`
        onto: String,
    },
    /// Remote branch exists and is behind
    Push,
    /// Nothing to push (or pushing would need a manual decision)
    Skip(Divergence),
}

/// What to do with the merge request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeRequestAction {
    /// Open a new one
    Create(NewMergeRequest),
    /// An open one exists already
    Existing(u64),
}

/// Submission plan - the functional core output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPlan {
    /// Branch being submitted
    pub branch: String,
    /// Push step
    pub push: PushAction,
    /// Merge request step
    pub merge_request: MergeRequestAction,
}

/// Create a submission plan (PURE - no I/O)
pub fn plan_submission(
    facts: &SubmissionFacts,
    title: Option<&str>,
    assignee_id: Option<u64>,
) -> Result<SubmissionPlan> {
    let push = if facts.branch_on_remote {
        let divergence = facts.divergence.ok_or_else(|| {
            Error::Internal(format!(
                "no divergence known for remote branch {}",
                facts.branch
            ))
        })?;
        match divergence {
            Divergence::NeedToPush => PushAction::Push,
            other => PushAction::Skip(other),
        }
    } else {
        PushAction::RebaseAndPush {
            onto: format!("{}/{}", facts.remote, facts.default_branch),
        }
    };

    let merge_request = match facts.open_merge_request {
        Some(iid) => MergeRequestAction::Existing(iid),
        None => {
            let title = title
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(&facts.last_commit_subject);
            MergeRequestAction::Create(NewMergeRequest {
                source_branch: facts.branch.clone(),
                target_branch: facts.default_branch.clone(),
                title: title.to_string(),
                assignee_id,
            })
        }
    };

    Ok(SubmissionPlan {
        branch: facts.branch.clone(),
        push,
        merge_request,
    })
}

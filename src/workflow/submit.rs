//! Submitting a patch: push the issue branch and open a merge request
//!
//! Three phases:
//! 1. Gather - preconditions and facts from git and the platform
//! 2. Plan - [`plan_submission`] (pure)
//! 3. Execute - rebase/push and merge request creation

use crate::error::{Error, Result};
use crate::git::{
    Divergence, RepositoryHandle, classify_divergence, is_commit_on_remote, is_working_tree_clean,
};
use crate::platform::PlatformService;
use crate::report::Report;
use crate::types::MergeRequest;
use crate::workflow::parse_id;
use crate::workflow::plan::{
    MergeRequestAction, PushAction, SubmissionFacts, SubmissionPlan, plan_submission,
};
use tracing::debug;

/// Caller input for [`submit_patch`]
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    /// Assignee user id, as typed by the user
    pub assignee: Option<String>,
    /// Merge request title; defaults to the last commit subject
    pub title: Option<String>,
}

/// Result of [`submit_patch`]
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    /// Messages for the user
    pub report: Report,
    /// Whether commits were pushed
    pub pushed: bool,
    /// Whether a new merge request was created
    pub created: bool,
    /// The created merge request, if any
    pub merge_request: Option<MergeRequest>,
}

/// Push the current branch and make sure a merge request into the default
/// branch exists for it.
pub async fn submit_patch(
    repo: &RepositoryHandle,
    platform: &dyn PlatformService,
    options: &SubmitOptions,
) -> Result<SubmitOutcome> {
    // Validated up front so a typo cannot leave a pushed branch behind
    let assignee_id = options
        .assignee
        .as_deref()
        .map(parse_id)
        .transpose()?;

    let facts = gather_facts(repo, platform).await?;
    let plan = plan_submission(&facts, options.title.as_deref(), assignee_id)?;
    debug!(?plan, "submission plan");
    execute_submission(repo, platform, &plan).await
}

async fn gather_facts(
    repo: &RepositoryHandle,
    platform: &dyn PlatformService,
) -> Result<SubmissionFacts> {
    let branch = repo.current_branch()?;
    let default_branch = repo.default_branch()?;

    if branch == default_branch {
        return Err(Error::PreconditionFailed(format!(
            "You can not open a merge request from your local {default_branch} branch.\n\
             Please switch to your issue branch!"
        )));
    }
    if branch == "HEAD" {
        return Err(Error::PreconditionFailed(
            "HEAD is detached. Please switch to your issue branch!".to_string(),
        ));
    }
    if !is_working_tree_clean(repo)? {
        let status = repo.short_status()?;
        return Err(Error::PreconditionFailed(format!(
            "You have uncommitted changes. Please commit them first!\n{status}"
        )));
    }

    repo.fetch()?;
    let sha = repo.head_sha()?;
    if is_commit_on_remote(repo, Some(&sha), &default_branch)? {
        return Err(Error::AlreadyMerged {
            sha,
            branch: repo.remote_ref(&default_branch),
        });
    }

    let branch_on_remote = platform.branch_exists(&branch).await?;
    let divergence = if branch_on_remote {
        Some(classify_divergence(repo, &branch, &branch)?)
    } else {
        None
    };
    let open_merge_request = platform
        .find_open_merge_request(&branch, &default_branch)
        .await?
        .map(|mr| mr.iid);

    Ok(SubmissionFacts {
        last_commit_subject: repo.last_commit_subject()?,
        remote: repo.remote().to_string(),
        branch,
        default_branch,
        branch_on_remote,
        divergence,
        open_merge_request,
    })
}

async fn execute_submission(
    repo: &RepositoryHandle,
    platform: &dyn PlatformService,
    plan: &SubmissionPlan,
) -> Result<SubmitOutcome> {
    let branch = &plan.branch;
    let mut report = Report::new();
    report.info(format!("Branch: {branch}"));

    let pushed = match &plan.push {
        PushAction::RebaseAndPush { onto } => {
            report.info(format!("Rebasing {branch} onto {onto}"));
            rebase(repo, branch, onto)?;
            report.info(format!("Pushing to {} {branch}", repo.remote()));
            repo.push_branch(branch)?;
            true
        }
        PushAction::Push => {
            report.info(format!("Pushing to {} {branch}", repo.remote()));
            repo.push_branch(branch)?;
            true
        }
        PushAction::Skip(divergence) => {
            match divergence {
                Divergence::Diverged => report.warn(format!(
                    "Local and remote {branch} have diverged; not pushing. \
                     Reconcile them with 'git pull --rebase' first."
                )),
                Divergence::NeedToPull => report.warn(format!(
                    "Remote {branch} has commits you do not have; not pushing."
                )),
                _ => report.info("Local and remote are up-to-date."),
            }
            false
        }
    };

    let (created, merge_request) = match &plan.merge_request {
        MergeRequestAction::Existing(iid) => {
            report.info(format!("Merge request !{iid} exists. Skipping"));
            (false, None)
        }
        MergeRequestAction::Create(request) => {
            let mr = platform.create_merge_request(request).await?;
            report.success(format!("Created merge request !{}: {}", mr.iid, mr.title));
            if !mr.web_url.is_empty() {
                report.info(mr.web_url.clone());
            }
            (true, Some(mr))
        }
    };

    Ok(SubmitOutcome {
        report,
        pushed,
        created,
        merge_request,
    })
}

/// Rebase `branch` onto `onto`, aborting and reporting on conflict
fn rebase(repo: &RepositoryHandle, branch: &str, onto: &str) -> Result<()> {
    let out = repo.git_output(&["rebase", onto])?;
    if out.success {
        return Ok(());
    }

    debug!(branch, onto, "rebase failed, aborting");
    let message = if out.stderr.trim().is_empty() {
        out.stdout.trim().to_string()
    } else {
        out.stderr.trim().to_string()
    };
    repo.git(&["rebase", "--abort"])?;
    Err(Error::RebaseConflict {
        branch: branch.to_string(),
        onto: onto.to_string(),
        message,
    })
}

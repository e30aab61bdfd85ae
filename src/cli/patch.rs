//! Patch workflow commands: start, commit, accept, and merge request views

use crate::cli::context::CommandContext;
use crate::cli::finish;
use crate::cli::render::{print_merge_request, print_notes};
use crate::cli::style::{Stylize, spinner_style};
use anstream::println;
use dialoguer::Confirm;
use indicatif::ProgressBar;
use patchflow::error::{Error, Result};
use patchflow::types::{MergeRequest, MergeRequestState};
use patchflow::workflow::{SubmitOptions, accept_merge, parse_id, start_patch, submit_patch};
use std::path::Path;
use std::time::Duration;

/// List merge requests of the current project
pub async fn run_merge_requests(path: &Path, config: Option<&Path>, all: bool) -> Result<i32> {
    let ctx = CommandContext::new(path, config).await?;
    let requests = ctx.platform.list_merge_requests().await?;

    let shown: Vec<&MergeRequest> = requests
        .iter()
        .filter(|mr| all || mr.state == MergeRequestState::Opened)
        .collect();
    if shown.is_empty() {
        println!("{}", "No merge requests found".muted());
    }
    for mr in shown {
        print_merge_request(mr);
    }
    Ok(0)
}

/// Show one merge request and its comments
pub async fn run_merge_details(path: &Path, config: Option<&Path>, id: &str) -> Result<i32> {
    let iid = parse_id(id)?;
    let ctx = CommandContext::new(path, config).await?;
    let mr = ctx
        .platform
        .get_merge_request(iid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Merge request !{iid} not found")))?;
    let notes = ctx.platform.list_merge_request_notes(iid).await?;

    print_merge_request(&mr);
    print_notes(&notes);
    Ok(0)
}

/// Start working on an issue
pub async fn run_start_patch(path: &Path, config: Option<&Path>, issue_id: &str) -> Result<i32> {
    let ctx = CommandContext::new(path, config).await?;
    let report = start_patch(&ctx.repo, ctx.platform.as_ref(), issue_id).await?;
    Ok(finish(&report))
}

/// Push the issue branch and open a merge request
pub async fn run_commit_patch(
    path: &Path,
    config: Option<&Path>,
    assignee: Option<String>,
    title: Option<String>,
) -> Result<i32> {
    let ctx = CommandContext::new(path, config).await?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.set_message(format!("Submitting {}...", ctx.repo.current_branch()?.accent()));
    spinner.enable_steady_tick(Duration::from_millis(80));

    let options = SubmitOptions { assignee, title };
    let outcome = submit_patch(&ctx.repo, ctx.platform.as_ref(), &options).await;
    spinner.finish_and_clear();

    Ok(finish(&outcome?.report))
}

/// Trial-merge and accept a merge request
pub async fn run_accept_merge(
    path: &Path,
    config: Option<&Path>,
    id: &str,
    assume_yes: bool,
) -> Result<i32> {
    let ctx = CommandContext::new(path, config).await?;

    let confirm = |mr: &MergeRequest| -> Result<bool> {
        if assume_yes {
            return Ok(true);
        }
        print_merge_request(mr);
        Confirm::new()
            .with_prompt(format!("Should merge request !{} be merged?", mr.iid))
            .default(false)
            .interact()
            .map_err(|e| Error::Internal(format!("Failed to read confirmation: {e}")))
    };

    let report = accept_merge(&ctx.repo, ctx.platform.as_ref(), id, confirm).await?;
    Ok(finish(&report))
}

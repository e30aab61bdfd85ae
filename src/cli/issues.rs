//! Issue and member commands

use crate::cli::context::CommandContext;
use crate::cli::finish;
use crate::cli::render::{print_issue, print_member};
use crate::cli::style::Stylize;
use anstream::println;
use patchflow::error::{Error, Result};
use patchflow::types::{Issue, IssueAction, IssueState};
use patchflow::workflow::set_issue_state;
use std::path::Path;

fn print_issues(issues: &[Issue], all: bool, empty_hint: &str) {
    let mut shown = 0;
    for issue in issues.iter().filter(|i| all || i.state != IssueState::Closed) {
        print_issue(issue);
        shown += 1;
    }
    if shown == 0 {
        println!("{}", empty_hint.muted());
    }
}

/// List issues of the current project
pub async fn run_issues(path: &Path, config: Option<&Path>, all: bool) -> Result<i32> {
    let ctx = CommandContext::new(path, config).await?;
    let issues = ctx.platform.list_issues().await?;
    print_issues(&issues, all, "No issues found");
    Ok(0)
}

/// List issues assigned to the authenticated user
pub async fn run_my_issues(path: &Path, config: Option<&Path>, all: bool) -> Result<i32> {
    let ctx = CommandContext::new(path, config).await?;
    let issues = ctx.platform.list_my_issues().await?;
    print_issues(
        &issues,
        all,
        "No open issues found. Try 'patchflow my-issues --all'",
    );
    Ok(0)
}

/// List members of the configured group
pub async fn run_members(path: &Path, config: Option<&Path>) -> Result<i32> {
    let ctx = CommandContext::new(path, config).await?;
    let group = ctx
        .settings
        .group
        .as_deref()
        .ok_or_else(|| Error::Config("no 'group' configured".to_string()))?;

    let members = ctx.platform.list_group_members(group).await?;
    if members.is_empty() {
        println!("{}", "No project members found".muted());
    }
    for member in &members {
        print_member(member);
    }
    Ok(0)
}

/// Close or reopen an issue
pub async fn run_set_state(
    path: &Path,
    config: Option<&Path>,
    id: &str,
    action: IssueAction,
) -> Result<i32> {
    let ctx = CommandContext::new(path, config).await?;
    let report = set_issue_state(ctx.platform.as_ref(), id, action).await?;
    Ok(finish(&report))
}

//! Starting work on an issue

use crate::error::{Error, Result};
use crate::git::{BranchSwitch, RepositoryHandle, is_working_tree_clean};
use crate::platform::PlatformService;
use crate::report::Report;
use crate::workflow::{issue_branch_name, parse_id};
use tracing::debug;

/// Switch to the branch for `issue_id`, creating it from the remote default
/// branch when needed.
///
/// Calling it again for the same issue only switches branches.
pub async fn start_patch(
    repo: &RepositoryHandle,
    platform: &dyn PlatformService,
    issue_id: &str,
) -> Result<Report> {
    let id = parse_id(issue_id)?;

    if !repo.is_repository() {
        return Err(Error::PreconditionFailed(format!(
            "Not a git repository: {}",
            repo.root().display()
        )));
    }
    if !is_working_tree_clean(repo)? {
        return Err(Error::PreconditionFailed(
            "Your branch is not clean. Please commit your changes first.".to_string(),
        ));
    }

    let project = platform.project();
    let issue = platform
        .get_issue(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Issue {id} not found in {}", project.path)))?;
    if issue.project_id != project.id {
        return Err(Error::NotFound(format!(
            "Issue {id} does not belong to {}",
            project.path
        )));
    }

    let default_branch = repo.default_branch()?;
    let upstream = repo.remote_ref(&default_branch);
    let branch = issue_branch_name(id);
    debug!(%branch, %upstream, "starting patch");

    repo.fetch()?;
    let mut report = Report::new();
    match repo.switch_or_create_branch(&branch, &upstream)? {
        BranchSwitch::Created => {
            report.success(format!("Created {branch} from {upstream}"));
        }
        BranchSwitch::Switched => report.info(format!("Switched to {branch}")),
        BranchSwitch::AlreadyOn => report.info(format!("Already on {branch}")),
    }
    report.info(format!("Issue #{id}: {}", issue.title));
    Ok(report)
}

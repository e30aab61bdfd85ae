//! Closing and reopening issues

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::report::{Level, Report};
use crate::types::IssueAction;
use crate::workflow::parse_id;

/// Close or reopen an issue of the current project
pub async fn set_issue_state(
    platform: &dyn PlatformService,
    issue_id: &str,
    action: IssueAction,
) -> Result<Report> {
    let id = parse_id(issue_id)?;
    if platform.get_issue(id).await?.is_none() {
        return Err(Error::NotFound(format!("Issue {id} not found")));
    }

    let issue = platform.set_issue_state(id, action).await?;
    let mut report = Report::new();
    if issue.state == action.expected_state() {
        let verb = match action {
            IssueAction::Close => "closed",
            IssueAction::Reopen => "reopened",
        };
        report.success(format!("Issue {id} {verb}"));
    } else {
        report.push(
            Level::Failure,
            format!("Issue {id} has state: {}", issue.state),
        );
    }
    Ok(report)
}

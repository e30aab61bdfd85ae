//! Accepting a merge request after a local trial merge

use crate::error::{Error, Result};
use crate::git::{RepositoryHandle, probe_mergeable};
use crate::platform::PlatformService;
use crate::report::Report;
use crate::types::{MergeRequest, MergeRequestState};
use crate::workflow::{CONFLICT_COMMENT, parse_id};
use tracing::debug;

/// Merge a merge request on the platform.
///
/// `confirm` is asked once the merge request is known to be open; declining
/// ends the operation without side effects. Before the platform merge is
/// attempted the branches are trial-merged locally: on conflict a comment is
/// left on the merge request and [`Error::ConflictDetected`] is returned.
/// After a successful merge the remote source branch is deleted.
pub async fn accept_merge<F>(
    repo: &RepositoryHandle,
    platform: &dyn PlatformService,
    mr_id: &str,
    confirm: F,
) -> Result<Report>
where
    F: FnOnce(&MergeRequest) -> Result<bool>,
{
    let id = parse_id(mr_id)?;

    let mr = platform
        .get_merge_request(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Merge request !{id} not found")))?;
    if mr.state != MergeRequestState::Opened {
        return Err(Error::AlreadyClosed {
            id,
            state: mr.state.to_string(),
        });
    }

    let mut report = Report::new();
    if !confirm(&mr)? {
        report.info("Merge aborted!");
        return Ok(report);
    }

    report.info(format!(
        "Trial merge of {} into {}",
        mr.target_branch, mr.source_branch
    ));
    if !probe_mergeable(repo, &mr.source_branch, &mr.target_branch)? {
        debug!(mr_iid = id, "trial merge conflicted, commenting");
        platform.create_merge_request_note(id, CONFLICT_COMMENT).await?;
        return Err(Error::ConflictDetected(id));
    }

    let merged = platform.accept_merge_request(id).await?;
    if merged.state != MergeRequestState::Merged {
        return Err(Error::UnexpectedState {
            id,
            state: merged.state.to_string(),
        });
    }

    report.success(format!("Merge complete. Remove {}", merged.source_branch));
    repo.delete_remote_branch(&merged.source_branch)?;
    Ok(report)
}

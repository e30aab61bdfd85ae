//! Platform services for GitLab and GitHub
//!
//! Provides a unified interface for the issue and merge request operations
//! the workflow needs.

mod detection;
mod factory;
mod github;
mod gitlab;

pub use detection::project_path_from_remote;
pub use factory::create_platform_service;
pub use github::GitHubService;
pub use gitlab::GitLabService;

use crate::error::Result;
use crate::types::{
    Group, GroupProject, Issue, IssueAction, MergeRequest, MergeRequestState, NewMergeRequest,
    Note, RemoteProject, User,
};
use async_trait::async_trait;

/// Number of items requested per list call. Pagination is not followed.
pub const PAGE_SIZE: u32 = 100;

/// Platform service trait for issue and merge request operations
///
/// This trait abstracts GitLab and GitHub operations, allowing the same
/// workflow logic to work with either platform. Implementations resolve the
/// project when they are constructed.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// The project the service is bound to
    fn project(&self) -> &RemoteProject;

    /// List issues of the project (all states)
    async fn list_issues(&self) -> Result<Vec<Issue>>;

    /// List issues assigned to the authenticated user, across projects
    async fn list_my_issues(&self) -> Result<Vec<Issue>>;

    /// Get an issue by its display id; `None` if it does not exist
    async fn get_issue(&self, iid: u64) -> Result<Option<Issue>>;

    /// Close or reopen an issue, returning its new representation
    async fn set_issue_state(&self, iid: u64, action: IssueAction) -> Result<Issue>;

    /// List merge requests of the project (all states)
    async fn list_merge_requests(&self) -> Result<Vec<MergeRequest>>;

    /// Get a merge request by display id; `None` if it does not exist
    async fn get_merge_request(&self, iid: u64) -> Result<Option<MergeRequest>>;

    /// List the human comments on a merge request
    async fn list_merge_request_notes(&self, iid: u64) -> Result<Vec<Note>>;

    /// Create a merge request
    async fn create_merge_request(&self, request: &NewMergeRequest) -> Result<MergeRequest>;

    /// Accept (merge) a merge request and return its resulting representation
    async fn accept_merge_request(&self, iid: u64) -> Result<MergeRequest>;

    /// Add a comment to a merge request
    async fn create_merge_request_note(&self, iid: u64, body: &str) -> Result<()>;

    /// Whether `branch` exists in the remote project
    async fn branch_exists(&self, branch: &str) -> Result<bool>;

    /// List groups visible to the authenticated user
    async fn list_groups(&self) -> Result<Vec<Group>>;

    /// List members of the group named `group`
    async fn list_group_members(&self, group: &str) -> Result<Vec<User>>;

    /// List projects of the group named `group`
    async fn list_group_projects(&self, group: &str) -> Result<Vec<GroupProject>>;

    /// Find an open merge request for `source` -> `target`.
    ///
    /// Default implementation filters [`list_merge_requests`].
    ///
    /// [`list_merge_requests`]: Self::list_merge_requests
    async fn find_open_merge_request(
        &self,
        source: &str,
        target: &str,
    ) -> Result<Option<MergeRequest>> {
        let requests = self.list_merge_requests().await?;
        Ok(requests.into_iter().find(|mr| {
            mr.state == MergeRequestState::Opened
                && mr.source_branch == source
                && mr.target_branch == target
        }))
    }

    /// Find a group by exact name
    async fn find_group(&self, name: &str) -> Result<Option<Group>> {
        let groups = self.list_groups().await?;
        Ok(groups.into_iter().find(|g| g.name == name))
    }
}

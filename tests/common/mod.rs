//! Shared test support

mod mock_platform;
mod temp_repo;

#[allow(unused_imports)]
pub use mock_platform::{CreateNoteCall, MockPlatformService};
#[allow(unused_imports)]
pub use temp_repo::{TempGitRepo, git};

use patchflow::types::{
    Issue, IssueState, MergeRequest, MergeRequestState, RemoteProject, User,
};

/// Project id the mock platform is bound to
#[allow(dead_code)]
pub const PROJECT_ID: u64 = 77;

/// The project the mock platform reports
#[allow(dead_code)]
pub fn test_project() -> RemoteProject {
    RemoteProject {
        id: PROJECT_ID,
        path: "salt/states".to_string(),
        default_branch: Some("master".to_string()),
        web_url: "https://gitlab.example.com/salt/states".to_string(),
    }
}

/// A user fixture
#[allow(dead_code)]
pub fn make_user(id: u64, name: &str) -> User {
    User {
        id,
        name: name.to_string(),
        username: name.to_lowercase().replace(' ', "."),
    }
}

/// An open issue of the test project
#[allow(dead_code)]
pub fn make_issue(iid: u64, title: &str) -> Issue {
    Issue {
        id: 1000 + iid,
        iid,
        project_id: PROJECT_ID,
        title: title.to_string(),
        description: Some(format!("Description of {title}")),
        state: IssueState::Opened,
        author: Some(make_user(1, "Jane Doe")),
        assignee: None,
        web_url: format!("https://gitlab.example.com/salt/states/issues/{iid}"),
    }
}

/// A merge request fixture
#[allow(dead_code)]
pub fn make_mr(iid: u64, source: &str, target: &str, state: MergeRequestState) -> MergeRequest {
    MergeRequest {
        id: 5000 + iid,
        iid,
        title: format!("Merge {source}"),
        source_branch: source.to_string(),
        target_branch: target.to_string(),
        state,
        author: Some(make_user(1, "Jane Doe")),
        assignee: None,
        created_at: None,
        web_url: format!("https://gitlab.example.com/salt/states/merge_requests/{iid}"),
    }
}

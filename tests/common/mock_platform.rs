//! Mock platform service for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use patchflow::error::{Error, Result};
use patchflow::platform::PlatformService;
use patchflow::types::{
    Group, GroupProject, Issue, IssueAction, MergeRequest, MergeRequestState, NewMergeRequest,
    Note, RemoteProject, User,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::process::Command;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Call record for `create_merge_request_note`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateNoteCall {
    pub iid: u64,
    pub body: String,
}

/// Simple mock platform service for testing
///
/// This manually implements `PlatformService` rather than using a mocking
/// crate, because `project()` returns a reference.
///
/// Features:
/// - Issues and merge requests kept in maps, created merge requests added
/// - Remote branches either listed explicitly or read from a bare repository
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockPlatformService {
    project: RemoteProject,
    next_iid: AtomicU64,
    issues: Mutex<BTreeMap<u64, Issue>>,
    merge_requests: Mutex<BTreeMap<u64, MergeRequest>>,
    notes: Mutex<BTreeMap<u64, Vec<Note>>>,
    remote_branches: Mutex<BTreeSet<String>>,
    bare_remote: Option<PathBuf>,
    members: Mutex<Vec<User>>,
    groups: Mutex<Vec<Group>>,
    group_projects: Mutex<Vec<GroupProject>>,
    accept_result_state: Mutex<Option<MergeRequestState>>,
    // Call tracking
    get_issue_calls: Mutex<Vec<u64>>,
    set_issue_state_calls: Mutex<Vec<(u64, IssueAction)>>,
    create_mr_calls: Mutex<Vec<NewMergeRequest>>,
    accept_calls: Mutex<Vec<u64>>,
    create_note_calls: Mutex<Vec<CreateNoteCall>>,
    branch_exists_calls: Mutex<Vec<String>>,
    // Error injection
    error_on_get_issue: Mutex<Option<String>>,
    error_on_create_mr: Mutex<Option<String>>,
    error_on_accept: Mutex<Option<String>>,
}

impl MockPlatformService {
    /// Create a new mock bound to `project`
    pub fn with_project(project: RemoteProject) -> Self {
        Self {
            project,
            next_iid: AtomicU64::new(100),
            issues: Mutex::new(BTreeMap::new()),
            merge_requests: Mutex::new(BTreeMap::new()),
            notes: Mutex::new(BTreeMap::new()),
            remote_branches: Mutex::new(BTreeSet::new()),
            bare_remote: None,
            members: Mutex::new(Vec::new()),
            groups: Mutex::new(Vec::new()),
            group_projects: Mutex::new(Vec::new()),
            accept_result_state: Mutex::new(None),
            get_issue_calls: Mutex::new(Vec::new()),
            set_issue_state_calls: Mutex::new(Vec::new()),
            create_mr_calls: Mutex::new(Vec::new()),
            accept_calls: Mutex::new(Vec::new()),
            create_note_calls: Mutex::new(Vec::new()),
            branch_exists_calls: Mutex::new(Vec::new()),
            error_on_get_issue: Mutex::new(None),
            error_on_create_mr: Mutex::new(None),
            error_on_accept: Mutex::new(None),
        }
    }

    /// Answer `branch_exists` from the branches of a bare repository
    #[must_use]
    pub fn backed_by(mut self, bare_remote: PathBuf) -> Self {
        self.bare_remote = Some(bare_remote);
        self
    }

    // === Response setup ===

    pub fn add_issue(&self, issue: Issue) {
        self.issues.lock().unwrap().insert(issue.iid, issue);
    }

    pub fn add_merge_request(&self, mr: MergeRequest) {
        self.merge_requests.lock().unwrap().insert(mr.iid, mr);
    }

    pub fn add_note(&self, iid: u64, note: Note) {
        self.notes.lock().unwrap().entry(iid).or_default().push(note);
    }

    pub fn add_remote_branch(&self, branch: &str) {
        self.remote_branches
            .lock()
            .unwrap()
            .insert(branch.to_string());
    }

    pub fn add_member(&self, user: User) {
        self.members.lock().unwrap().push(user);
    }

    pub fn add_group(&self, group: Group) {
        self.groups.lock().unwrap().push(group);
    }

    pub fn add_group_project(&self, project: GroupProject) {
        self.group_projects.lock().unwrap().push(project);
    }

    /// State reported by `accept_merge_request` instead of `merged`
    pub fn set_accept_result_state(&self, state: MergeRequestState) {
        *self.accept_result_state.lock().unwrap() = Some(state);
    }

    // === Error injection methods ===

    pub fn fail_get_issue(&self, msg: &str) {
        *self.error_on_get_issue.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_create_mr(&self, msg: &str) {
        *self.error_on_create_mr.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_accept(&self, msg: &str) {
        *self.error_on_accept.lock().unwrap() = Some(msg.to_string());
    }

    // === Call inspection ===

    pub fn get_issue_calls(&self) -> Vec<u64> {
        self.get_issue_calls.lock().unwrap().clone()
    }

    pub fn set_issue_state_calls(&self) -> Vec<(u64, IssueAction)> {
        self.set_issue_state_calls.lock().unwrap().clone()
    }

    pub fn create_mr_calls(&self) -> Vec<NewMergeRequest> {
        self.create_mr_calls.lock().unwrap().clone()
    }

    pub fn accept_calls(&self) -> Vec<u64> {
        self.accept_calls.lock().unwrap().clone()
    }

    pub fn create_note_calls(&self) -> Vec<CreateNoteCall> {
        self.create_note_calls.lock().unwrap().clone()
    }

    pub fn branch_exists_calls(&self) -> Vec<String> {
        self.branch_exists_calls.lock().unwrap().clone()
    }

    pub fn assert_no_side_effects(&self) {
        assert!(self.create_mr_calls().is_empty(), "unexpected MR creation");
        assert!(self.accept_calls().is_empty(), "unexpected accept");
        assert!(self.create_note_calls().is_empty(), "unexpected note");
        assert!(
            self.set_issue_state_calls().is_empty(),
            "unexpected issue edit"
        );
    }

    fn bare_has_branch(bare: &PathBuf, branch: &str) -> bool {
        Command::new("git")
            .arg("--git-dir")
            .arg(bare)
            .args(["show-ref", "--verify", "--quiet"])
            .arg(format!("refs/heads/{branch}"))
            .status()
            .is_ok_and(|s| s.success())
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    fn project(&self) -> &RemoteProject {
        &self.project
    }

    async fn list_issues(&self) -> Result<Vec<Issue>> {
        Ok(self.issues.lock().unwrap().values().cloned().collect())
    }

    async fn list_my_issues(&self) -> Result<Vec<Issue>> {
        Ok(self
            .issues
            .lock()
            .unwrap()
            .values()
            .filter(|i| i.assignee.is_some())
            .cloned()
            .collect())
    }

    async fn get_issue(&self, iid: u64) -> Result<Option<Issue>> {
        self.get_issue_calls.lock().unwrap().push(iid);
        if let Some(msg) = self.error_on_get_issue.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }
        Ok(self.issues.lock().unwrap().get(&iid).cloned())
    }

    async fn set_issue_state(&self, iid: u64, action: IssueAction) -> Result<Issue> {
        self.set_issue_state_calls
            .lock()
            .unwrap()
            .push((iid, action));
        let mut issues = self.issues.lock().unwrap();
        let issue = issues
            .get_mut(&iid)
            .ok_or_else(|| Error::NotFound(format!("Issue {iid} not found")))?;
        issue.state = action.expected_state();
        Ok(issue.clone())
    }

    async fn list_merge_requests(&self) -> Result<Vec<MergeRequest>> {
        Ok(self
            .merge_requests
            .lock()
            .unwrap()
            .values()
            .cloned()
            .collect())
    }

    async fn get_merge_request(&self, iid: u64) -> Result<Option<MergeRequest>> {
        Ok(self.merge_requests.lock().unwrap().get(&iid).cloned())
    }

    async fn list_merge_request_notes(&self, iid: u64) -> Result<Vec<Note>> {
        Ok(self
            .notes
            .lock()
            .unwrap()
            .get(&iid)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_merge_request(&self, request: &NewMergeRequest) -> Result<MergeRequest> {
        self.create_mr_calls.lock().unwrap().push(request.clone());
        if let Some(msg) = self.error_on_create_mr.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }

        let iid = self.next_iid.fetch_add(1, Ordering::SeqCst);
        let mr = MergeRequest {
            id: 5000 + iid,
            iid,
            title: request.title.clone(),
            source_branch: request.source_branch.clone(),
            target_branch: request.target_branch.clone(),
            state: MergeRequestState::Opened,
            author: None,
            assignee: request.assignee_id.map(|id| User {
                id,
                name: format!("user {id}"),
                username: format!("user{id}"),
            }),
            created_at: None,
            web_url: format!("{}/merge_requests/{iid}", self.project.web_url),
        };
        self.merge_requests.lock().unwrap().insert(iid, mr.clone());
        Ok(mr)
    }

    async fn accept_merge_request(&self, iid: u64) -> Result<MergeRequest> {
        self.accept_calls.lock().unwrap().push(iid);
        if let Some(msg) = self.error_on_accept.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }

        let state = self
            .accept_result_state
            .lock()
            .unwrap()
            .unwrap_or(MergeRequestState::Merged);
        let mut requests = self.merge_requests.lock().unwrap();
        let mr = requests
            .get_mut(&iid)
            .ok_or_else(|| Error::NotFound(format!("Merge request !{iid} not found")))?;
        mr.state = state;
        Ok(mr.clone())
    }

    async fn create_merge_request_note(&self, iid: u64, body: &str) -> Result<()> {
        self.create_note_calls.lock().unwrap().push(CreateNoteCall {
            iid,
            body: body.to_string(),
        });
        Ok(())
    }

    async fn branch_exists(&self, branch: &str) -> Result<bool> {
        self.branch_exists_calls
            .lock()
            .unwrap()
            .push(branch.to_string());
        if let Some(bare) = &self.bare_remote {
            return Ok(Self::bare_has_branch(bare, branch));
        }
        Ok(self.remote_branches.lock().unwrap().contains(branch))
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        Ok(self.groups.lock().unwrap().clone())
    }

    async fn list_group_members(&self, _group: &str) -> Result<Vec<User>> {
        Ok(self.members.lock().unwrap().clone())
    }

    async fn list_group_projects(&self, _group: &str) -> Result<Vec<GroupProject>> {
        Ok(self.group_projects.lock().unwrap().clone())
    }
}

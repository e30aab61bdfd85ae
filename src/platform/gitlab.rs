//! GitLab platform service implementation

use crate::error::{Error, Result};
use crate::platform::{PAGE_SIZE, PlatformService};
use crate::types::{
    Group, GroupProject, Issue, IssueAction, IssueState, MergeRequest, MergeRequestState,
    NewMergeRequest, Note, RemoteProject, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// GitLab service using reqwest
pub struct GitLabService {
    client: Client,
    token: String,
    base_url: String,
    project: RemoteProject,
}

#[derive(Deserialize)]
struct GlProject {
    id: u64,
    path_with_namespace: String,
    default_branch: Option<String>,
    web_url: String,
}

#[derive(Deserialize)]
struct GlUser {
    id: u64,
    name: String,
    username: String,
}

#[derive(Deserialize)]
struct GlIssue {
    id: u64,
    iid: u64,
    project_id: u64,
    title: String,
    description: Option<String>,
    state: String, // "opened", "closed", "reopened"
    author: Option<GlUser>,
    assignee: Option<GlUser>,
    web_url: String,
}

#[derive(Deserialize)]
struct GlMergeRequest {
    id: u64,
    iid: u64,
    title: String,
    source_branch: String,
    target_branch: String,
    state: String, // "opened", "closed", "merged", "locked"
    author: Option<GlUser>,
    assignee: Option<GlUser>,
    created_at: Option<DateTime<Utc>>,
    web_url: String,
}

#[derive(Deserialize)]
struct GlNote {
    id: u64,
    body: String,
    author: Option<GlUser>,
    #[serde(default)]
    system: bool,
}

#[derive(Deserialize)]
struct GlGroup {
    id: u64,
    name: String,
    full_path: String,
}

#[derive(Deserialize)]
struct GlGroupProject {
    ssh_url_to_repo: String,
    description: Option<String>,
}

impl From<GlUser> for User {
    fn from(u: GlUser) -> Self {
        Self {
            id: u.id,
            name: u.name,
            username: u.username,
        }
    }
}

impl From<GlIssue> for Issue {
    fn from(issue: GlIssue) -> Self {
        Self {
            id: issue.id,
            iid: issue.iid,
            project_id: issue.project_id,
            title: issue.title,
            description: issue.description,
            state: if issue.state == "closed" {
                IssueState::Closed
            } else {
                IssueState::Opened
            },
            author: issue.author.map(Into::into),
            assignee: issue.assignee.map(Into::into),
            web_url: issue.web_url,
        }
    }
}

impl From<GlMergeRequest> for MergeRequest {
    fn from(mr: GlMergeRequest) -> Self {
        Self {
            id: mr.id,
            iid: mr.iid,
            title: mr.title,
            source_branch: mr.source_branch,
            target_branch: mr.target_branch,
            state: MergeRequestState::from_gitlab(&mr.state),
            author: mr.author.map(Into::into),
            assignee: mr.assignee.map(Into::into),
            created_at: mr.created_at,
            web_url: mr.web_url,
        }
    }
}

impl From<GlGroup> for Group {
    fn from(g: GlGroup) -> Self {
        Self {
            id: g.id,
            name: g.name,
            path: g.full_path,
        }
    }
}

#[derive(Serialize)]
struct CreateMrPayload<'a> {
    source_branch: &'a str,
    target_branch: &'a str,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee_id: Option<u64>,
}

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Normalize a configured server address to `scheme://host[:port][/prefix]`
fn normalize_base_url(api_url: &str) -> String {
    let trimmed = api_url.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix("/api/v4").unwrap_or(trimmed);
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Build the HTTP client, optionally routed through a proxy
pub(super) fn build_client(proxy: Option<&str>, user_agent: &str) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .user_agent(user_agent.to_string());
    if let Some(proxy) = proxy {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| Error::Config(format!("invalid proxy '{proxy}': {e}")))?;
        builder = builder.proxy(proxy);
    }
    builder
        .build()
        .map_err(|e| Error::Platform(format!("failed to create HTTP client: {e}")))
}

impl GitLabService {
    /// Connect to a GitLab instance and resolve `project_path` to a project.
    ///
    /// `api_url` is the server address (`https://gitlab.example.com`); an
    /// `/api/v4` suffix is accepted.
    pub async fn connect(
        token: String,
        api_url: &str,
        project_path: &str,
        proxy: Option<&str>,
    ) -> Result<Self> {
        let client = build_client(proxy, "patchflow")?;
        let base_url = normalize_base_url(api_url);

        debug!(%base_url, project_path, "resolving GitLab project");
        let url = format!(
            "{base_url}/api/v4/projects/{}",
            urlencoding::encode(project_path)
        );
        let response = client
            .get(&url)
            .header("PRIVATE-TOKEN", &token)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!(
                "GitLab project '{project_path}' not found"
            )));
        }
        let project: GlProject = response
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;

        debug!(project_id = project.id, "resolved GitLab project");
        Ok(Self {
            client,
            token,
            base_url,
            project: RemoteProject {
                id: project.id,
                path: project.path_with_namespace,
                default_branch: project.default_branch,
                web_url: project.web_url,
            },
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v4{}", self.base_url, path)
    }

    fn project_url(&self, path: &str) -> String {
        self.api_url(&format!("/projects/{}{}", self.project.id, path))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("PRIVATE-TOKEN", &self.token)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let value = self
            .authorized(self.client.get(url))
            .query(&[("per_page", PAGE_SIZE)])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;
        Ok(value)
    }

    /// GET that maps 404 to `None`
    async fn get_optional<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let response = self.authorized(self.client.get(url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let value = response
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;
        Ok(Some(value))
    }

    async fn require_group(&self, name: &str) -> Result<Group> {
        self.find_group(name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("group '{name}' not found")))
    }
}

#[async_trait]
impl PlatformService for GitLabService {
    fn project(&self) -> &RemoteProject {
        &self.project
    }

    async fn list_issues(&self) -> Result<Vec<Issue>> {
        debug!(project_id = self.project.id, "listing issues");
        let issues: Vec<GlIssue> = self.get_json(&self.project_url("/issues")).await?;
        debug!(count = issues.len(), "listed issues");
        Ok(issues.into_iter().map(Into::into).collect())
    }

    async fn list_my_issues(&self) -> Result<Vec<Issue>> {
        debug!("listing issues assigned to me");
        let issues: Vec<GlIssue> = self
            .authorized(self.client.get(self.api_url("/issues")))
            .query(&[("scope", "assigned_to_me")])
            .query(&[("per_page", PAGE_SIZE)])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;
        Ok(issues.into_iter().map(Into::into).collect())
    }

    async fn get_issue(&self, iid: u64) -> Result<Option<Issue>> {
        debug!(issue_iid = iid, "getting issue");
        let issue: Option<GlIssue> = self
            .get_optional(&self.project_url(&format!("/issues/{iid}")))
            .await?;
        Ok(issue.map(Into::into))
    }

    async fn set_issue_state(&self, iid: u64, action: IssueAction) -> Result<Issue> {
        debug!(issue_iid = iid, %action, "editing issue state");
        let response = self
            .authorized(self.client.put(self.project_url(&format!("/issues/{iid}"))))
            .json(&serde_json::json!({ "state_event": action.to_string() }))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("Issue {iid} not found")));
        }
        let issue: GlIssue = response
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;
        Ok(issue.into())
    }

    async fn list_merge_requests(&self) -> Result<Vec<MergeRequest>> {
        debug!(project_id = self.project.id, "listing MRs");
        let mrs: Vec<GlMergeRequest> = self.get_json(&self.project_url("/merge_requests")).await?;
        debug!(count = mrs.len(), "listed MRs");
        Ok(mrs.into_iter().map(Into::into).collect())
    }

    async fn get_merge_request(&self, iid: u64) -> Result<Option<MergeRequest>> {
        debug!(mr_iid = iid, "getting MR");
        let mr: Option<GlMergeRequest> = self
            .get_optional(&self.project_url(&format!("/merge_requests/{iid}")))
            .await?;
        Ok(mr.map(Into::into))
    }

    async fn list_merge_request_notes(&self, iid: u64) -> Result<Vec<Note>> {
        debug!(mr_iid = iid, "listing MR notes");
        let notes: Vec<GlNote> = self
            .get_json(&self.project_url(&format!("/merge_requests/{iid}/notes")))
            .await?;
        Ok(notes
            .into_iter()
            .filter(|n| !n.system)
            .map(|n| Note {
                id: n.id,
                author: n.author.map(Into::into),
                body: n.body,
            })
            .collect())
    }

    async fn create_merge_request(&self, request: &NewMergeRequest) -> Result<MergeRequest> {
        debug!(
            source = %request.source_branch,
            target = %request.target_branch,
            "creating MR"
        );
        let payload = CreateMrPayload {
            source_branch: &request.source_branch,
            target_branch: &request.target_branch,
            title: &request.title,
            assignee_id: request.assignee_id,
        };

        let mr: GlMergeRequest = self
            .authorized(self.client.post(self.project_url("/merge_requests")))
            .json(&payload)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;

        debug!(mr_iid = mr.iid, "created MR");
        Ok(mr.into())
    }

    async fn accept_merge_request(&self, iid: u64) -> Result<MergeRequest> {
        debug!(mr_iid = iid, "accepting MR");
        let mr: GlMergeRequest = self
            .authorized(
                self.client
                    .put(self.project_url(&format!("/merge_requests/{iid}/merge"))),
            )
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(format!("Merge failed: {e}")))?
            .json()
            .await?;

        debug!(mr_iid = iid, state = %mr.state, "accept finished");
        Ok(mr.into())
    }

    async fn create_merge_request_note(&self, iid: u64, body: &str) -> Result<()> {
        debug!(mr_iid = iid, "creating MR note");
        self.authorized(
            self.client
                .post(self.project_url(&format!("/merge_requests/{iid}/notes"))),
        )
        .json(&serde_json::json!({ "body": body }))
        .send()
        .await?
        .error_for_status()
        .map_err(|e| Error::GitLabApi(e.to_string()))?;
        Ok(())
    }

    async fn branch_exists(&self, branch: &str) -> Result<bool> {
        debug!(branch, "checking remote branch");
        let url = self.project_url(&format!(
            "/repository/branches/{}",
            urlencoding::encode(branch)
        ));
        let found: Option<serde_json::Value> = self.get_optional(&url).await?;
        Ok(found.is_some())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        debug!("listing groups");
        let groups: Vec<GlGroup> = self.get_json(&self.api_url("/groups")).await?;
        Ok(groups.into_iter().map(Into::into).collect())
    }

    async fn list_group_members(&self, group: &str) -> Result<Vec<User>> {
        let group = self.require_group(group).await?;
        debug!(group_id = group.id, "listing group members");
        let members: Vec<GlUser> = self
            .get_json(&self.api_url(&format!("/groups/{}/members", group.id)))
            .await?;
        Ok(members.into_iter().map(Into::into).collect())
    }

    async fn list_group_projects(&self, group: &str) -> Result<Vec<GroupProject>> {
        let group = self.require_group(group).await?;
        debug!(group_id = group.id, "listing group projects");
        let projects: Vec<GlGroupProject> = self
            .get_json(&self.api_url(&format!("/groups/{}/projects", group.id)))
            .await?;
        Ok(projects
            .into_iter()
            .map(|p| GroupProject {
                ssh_url: p.ssh_url_to_repo,
                description: p.description,
            })
            .collect())
    }
}

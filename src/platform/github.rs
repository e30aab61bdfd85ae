//! GitHub platform service implementation
//!
//! Pull requests and their comments go through octocrab. Everything octocrab
//! has no typed builder for (issue state edits, branches, organizations) is
//! a raw REST call on a reqwest client.

use crate::error::{Error, Result};
use crate::platform::gitlab::build_client;
use crate::platform::{PAGE_SIZE, PlatformService};
use crate::types::{
    Group, GroupProject, Issue, IssueAction, IssueState, MergeRequest, MergeRequestState,
    NewMergeRequest, Note, RemoteProject, User,
};
use async_trait::async_trait;
use octocrab::Octocrab;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

const PUBLIC_API: &str = "https://api.github.com";

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    owner: String,
    repo: String,
    project: RemoteProject,
    /// Token for raw HTTP requests
    token: String,
    /// HTTP client for raw requests
    http_client: Client,
    /// API root for raw requests, e.g. `https://api.github.com`
    api_root: String,
}

#[derive(Deserialize)]
struct GhRepo {
    id: u64,
    full_name: String,
    default_branch: Option<String>,
    html_url: String,
}

#[derive(Deserialize)]
struct GhUser {
    id: u64,
    login: String,
    name: Option<String>,
}

#[derive(Deserialize)]
struct GhIssue {
    id: u64,
    number: u64,
    title: String,
    body: Option<String>,
    state: String, // "open", "closed"
    user: Option<GhUser>,
    assignee: Option<GhUser>,
    html_url: String,
    /// Present when the "issue" is really a pull request
    pull_request: Option<serde_json::Value>,
    repository_url: Option<String>,
}

#[derive(Deserialize)]
struct GhOrg {
    id: u64,
    login: String,
}

#[derive(Deserialize)]
struct GhOrgRepo {
    ssh_url: String,
    description: Option<String>,
}

impl From<GhUser> for User {
    fn from(u: GhUser) -> Self {
        Self {
            id: u.id,
            name: u.name.unwrap_or_else(|| u.login.clone()),
            username: u.login,
        }
    }
}

impl GhIssue {
    fn into_issue(self, project_id: u64) -> Issue {
        Issue {
            id: self.id,
            iid: self.number,
            project_id,
            title: self.title,
            description: self.body,
            state: if self.state == "closed" {
                IssueState::Closed
            } else {
                IssueState::Opened
            },
            author: self.user.map(Into::into),
            assignee: self.assignee.map(Into::into),
            web_url: self.html_url,
        }
    }
}

/// Resolve the configured API address to an API root.
///
/// No address means github.com; a bare host means GitHub Enterprise
/// (`https://<host>/api/v3`).
fn api_root(api_url: Option<&str>) -> String {
    match api_url.map(str::trim).filter(|u| !u.is_empty()) {
        None => PUBLIC_API.to_string(),
        Some(url) if url.contains("://") => url.trim_end_matches('/').to_string(),
        Some(host) if host.trim_end_matches('/') == "github.com" => PUBLIC_API.to_string(),
        Some(host) => format!("https://{}/api/v3", host.trim_end_matches('/')),
    }
}

fn author_from_octocrab(author: &octocrab::models::Author) -> User {
    User {
        id: author.id.0,
        name: author.login.clone(),
        username: author.login.clone(),
    }
}

/// Helper to convert octocrab PR to our `MergeRequest` type
fn mr_from_octocrab(pr: &octocrab::models::pulls::PullRequest) -> MergeRequest {
    let state = match pr.state {
        Some(octocrab::models::IssueState::Open) => MergeRequestState::Opened,
        Some(_) if pr.merged_at.is_some() => MergeRequestState::Merged,
        // IssueState is non-exhaustive
        Some(_) | None => MergeRequestState::Closed,
    };
    MergeRequest {
        id: pr.id.0,
        iid: pr.number,
        title: pr.title.as_deref().unwrap_or_default().to_string(),
        source_branch: pr.head.ref_field.clone(),
        target_branch: pr.base.ref_field.clone(),
        state,
        author: pr.user.as_deref().map(author_from_octocrab),
        assignee: pr.assignee.as_deref().map(author_from_octocrab),
        created_at: pr.created_at,
        web_url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
    }
}

impl GitHubService {
    /// Connect to GitHub and resolve `project_path` (`owner/repo`)
    pub async fn connect(
        token: String,
        api_url: Option<&str>,
        project_path: &str,
        proxy: Option<&str>,
    ) -> Result<Self> {
        let (owner, repo) = project_path.split_once('/').ok_or_else(|| {
            Error::Config(format!("'{project_path}' is not an owner/repo path"))
        })?;
        let api_root = api_root(api_url);

        let mut builder = Octocrab::builder().personal_token(token.clone());
        if api_root != PUBLIC_API {
            builder = builder
                .base_uri(api_root.as_str())
                .map_err(|e| Error::GitHubApi(e.to_string()))?;
        }
        let client = builder
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;
        let http_client = build_client(proxy, "patchflow")?;

        let mut service = Self {
            client,
            owner: owner.to_string(),
            repo: repo.to_string(),
            project: RemoteProject {
                id: 0,
                path: project_path.to_string(),
                default_branch: None,
                web_url: String::new(),
            },
            token,
            http_client,
            api_root,
        };

        debug!(project_path, "resolving GitHub repository");
        let found: Option<GhRepo> = service.get_optional(&service.repo_url("")).await?;
        let found = found.ok_or_else(|| {
            Error::NotFound(format!("GitHub repository '{project_path}' not found"))
        })?;
        service.project = RemoteProject {
            id: found.id,
            path: found.full_name,
            default_branch: found.default_branch,
            web_url: found.html_url,
        };
        Ok(service)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_root, path)
    }

    fn repo_url(&self, path: &str) -> String {
        self.url(&format!("/repos/{}/{}{}", self.owner, self.repo, path))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let value = self
            .authorized(self.http_client.get(url))
            .query(query)
            .query(&[("per_page", PAGE_SIZE)])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitHubApi(e.to_string()))?
            .json()
            .await?;
        Ok(value)
    }

    async fn get_optional<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let response = self.authorized(self.http_client.get(url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let value = response
            .error_for_status()
            .map_err(|e| Error::GitHubApi(e.to_string()))?
            .json()
            .await?;
        Ok(Some(value))
    }

    /// Look up a login by numeric user id
    async fn login_for(&self, user_id: u64) -> Result<String> {
        let user: Option<GhUser> = self.get_optional(&self.url(&format!("/user/{user_id}"))).await?;
        user.map(|u| u.login)
            .ok_or_else(|| Error::Validation(format!("Unknown assignee id {user_id}")))
    }
}

#[async_trait]
impl PlatformService for GitHubService {
    fn project(&self) -> &RemoteProject {
        &self.project
    }

    async fn list_issues(&self) -> Result<Vec<Issue>> {
        debug!(owner = %self.owner, repo = %self.repo, "listing issues");
        let issues: Vec<GhIssue> = self
            .get_json(&self.repo_url("/issues"), &[("state", "all")])
            .await?;
        let project_id = self.project.id;
        Ok(issues
            .into_iter()
            .filter(|i| i.pull_request.is_none())
            .map(|i| i.into_issue(project_id))
            .collect())
    }

    async fn list_my_issues(&self) -> Result<Vec<Issue>> {
        debug!("listing issues assigned to me");
        let issues: Vec<GhIssue> = self
            .get_json(&self.url("/issues"), &[("filter", "assigned"), ("state", "all")])
            .await?;
        let own_repo = self.repo_url("");
        let project_id = self.project.id;
        Ok(issues
            .into_iter()
            .filter(|i| i.pull_request.is_none())
            .map(|i| {
                // Other repositories have no id in this payload
                let id = if i.repository_url.as_deref() == Some(own_repo.as_str()) {
                    project_id
                } else {
                    0
                };
                i.into_issue(id)
            })
            .collect())
    }

    async fn get_issue(&self, iid: u64) -> Result<Option<Issue>> {
        debug!(issue_number = iid, "getting issue");
        let issue: Option<GhIssue> = self
            .get_optional(&self.repo_url(&format!("/issues/{iid}")))
            .await?;
        let project_id = self.project.id;
        Ok(issue
            .filter(|i| i.pull_request.is_none())
            .map(|i| i.into_issue(project_id)))
    }

    async fn set_issue_state(&self, iid: u64, action: IssueAction) -> Result<Issue> {
        debug!(issue_number = iid, %action, "editing issue state");
        let state = match action {
            IssueAction::Close => "closed",
            IssueAction::Reopen => "open",
        };
        let response = self
            .authorized(self.http_client.patch(self.repo_url(&format!("/issues/{iid}"))))
            .json(&serde_json::json!({ "state": state }))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("Issue {iid} not found")));
        }
        let issue: GhIssue = response
            .error_for_status()
            .map_err(|e| Error::GitHubApi(e.to_string()))?
            .json()
            .await?;
        Ok(issue.into_issue(self.project.id))
    }

    async fn list_merge_requests(&self) -> Result<Vec<MergeRequest>> {
        debug!(owner = %self.owner, repo = %self.repo, "listing PRs");
        let prs = self
            .client
            .pulls(&self.owner, &self.repo)
            .list()
            .state(octocrab::params::State::All)
            .per_page(100)
            .send()
            .await?;
        let result: Vec<MergeRequest> = prs.items.iter().map(mr_from_octocrab).collect();
        debug!(count = result.len(), "listed PRs");
        Ok(result)
    }

    async fn get_merge_request(&self, iid: u64) -> Result<Option<MergeRequest>> {
        debug!(pr_number = iid, "getting PR");
        match self.client.pulls(&self.owner, &self.repo).get(iid).await {
            Ok(pr) => Ok(Some(mr_from_octocrab(&pr))),
            Err(octocrab::Error::GitHub { source, .. })
                if source.status_code.as_u16() == 404 =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_merge_request_notes(&self, iid: u64) -> Result<Vec<Note>> {
        debug!(pr_number = iid, "listing PR comments");
        let comments = self
            .client
            .issues(&self.owner, &self.repo)
            .list_comments(iid)
            .send()
            .await?;

        let result: Vec<Note> = comments
            .items
            .into_iter()
            .map(|c| Note {
                id: c.id.0,
                author: Some(author_from_octocrab(&c.user)),
                body: c.body.unwrap_or_default(),
            })
            .collect();
        debug!(pr_number = iid, count = result.len(), "listed PR comments");
        Ok(result)
    }

    async fn create_merge_request(&self, request: &NewMergeRequest) -> Result<MergeRequest> {
        debug!(
            head = %request.source_branch,
            base = %request.target_branch,
            "creating PR"
        );
        // Resolve the assignee first so a bad id leaves nothing behind
        let assignee = match request.assignee_id {
            Some(id) => Some(self.login_for(id).await?),
            None => None,
        };

        let pr = self
            .client
            .pulls(&self.owner, &self.repo)
            .create(
                &request.title,
                &request.source_branch,
                &request.target_branch,
            )
            .send()
            .await?;
        let mut result = mr_from_octocrab(&pr);
        debug!(pr_number = result.iid, "created PR");

        if let Some(login) = assignee {
            debug!(pr_number = result.iid, %login, "assigning PR");
            let assigned: GhIssue = self
                .authorized(
                    self.http_client
                        .post(self.repo_url(&format!("/issues/{}/assignees", result.iid))),
                )
                .json(&serde_json::json!({ "assignees": [login] }))
                .send()
                .await?
                .error_for_status()
                .map_err(|e| Error::GitHubApi(e.to_string()))?
                .json()
                .await?;
            result.assignee = assigned.assignee.map(Into::into);
        }
        Ok(result)
    }

    async fn accept_merge_request(&self, iid: u64) -> Result<MergeRequest> {
        debug!(pr_number = iid, "merging PR");
        let merge = self
            .client
            .pulls(&self.owner, &self.repo)
            .merge(iid)
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Merge failed: {e}")))?;
        debug!(pr_number = iid, merged = merge.merged, sha = ?merge.sha, "merge complete");

        // The merge endpoint does not return the PR itself
        let pr = self.client.pulls(&self.owner, &self.repo).get(iid).await?;
        Ok(mr_from_octocrab(&pr))
    }

    async fn create_merge_request_note(&self, iid: u64, body: &str) -> Result<()> {
        debug!(pr_number = iid, "creating PR comment");
        self.client
            .issues(&self.owner, &self.repo)
            .create_comment(iid, body)
            .await?;
        debug!(pr_number = iid, "created PR comment");
        Ok(())
    }

    async fn branch_exists(&self, branch: &str) -> Result<bool> {
        debug!(branch, "checking remote branch");
        let url = self.repo_url(&format!("/branches/{}", urlencoding::encode(branch)));
        let found: Option<serde_json::Value> = self.get_optional(&url).await?;
        Ok(found.is_some())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        debug!("listing organizations");
        let orgs: Vec<GhOrg> = self.get_json(&self.url("/user/orgs"), &[]).await?;
        Ok(orgs
            .into_iter()
            .map(|o| Group {
                id: o.id,
                name: o.login.clone(),
                path: o.login,
            })
            .collect())
    }

    async fn list_group_members(&self, group: &str) -> Result<Vec<User>> {
        debug!(org = group, "listing organization members");
        let members: Vec<GhUser> = self
            .get_json(&self.url(&format!("/orgs/{group}/members")), &[])
            .await?;
        Ok(members.into_iter().map(Into::into).collect())
    }

    async fn list_group_projects(&self, group: &str) -> Result<Vec<GroupProject>> {
        debug!(org = group, "listing organization repositories");
        let repos: Vec<GhOrgRepo> = self
            .get_json(&self.url(&format!("/orgs/{group}/repos")), &[])
            .await?;
        Ok(repos
            .into_iter()
            .map(|r| GroupProject {
                ssh_url: r.ssh_url,
                description: r.description,
            })
            .collect())
    }
}

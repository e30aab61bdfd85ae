//! Core types for patchflow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hosting platform type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// GitLab or self-hosted GitLab
    #[default]
    GitLab,
    /// GitHub or GitHub Enterprise
    GitHub,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GitHub => write!(f, "GitHub"),
            Self::GitLab => write!(f, "GitLab"),
        }
    }
}

/// The remote project the current repository belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteProject {
    /// Platform-wide project id
    pub id: u64,
    /// `group/name` path
    pub path: String,
    /// Default branch as configured on the platform
    pub default_branch: Option<String>,
    /// Web URL
    pub web_url: String,
}

/// A user reference (author, assignee, member)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Platform user id
    pub id: u64,
    /// Display name
    pub name: String,
    /// Login name
    pub username: String,
}

/// Issue state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueState {
    /// Open (including reopened)
    Opened,
    /// Closed
    Closed,
}

impl std::fmt::Display for IssueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Opened => write!(f, "opened"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// State transition requested for an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueAction {
    /// Close the issue
    Close,
    /// Reopen the issue
    Reopen,
}

impl IssueAction {
    /// State the issue should end up in
    pub const fn expected_state(self) -> IssueState {
        match self {
            Self::Close => IssueState::Closed,
            Self::Reopen => IssueState::Opened,
        }
    }
}

impl std::fmt::Display for IssueAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Close => write!(f, "close"),
            Self::Reopen => write!(f, "reopen"),
        }
    }
}

/// An issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Platform-wide id
    pub id: u64,
    /// Per-project display id
    pub iid: u64,
    /// Project the issue belongs to
    pub project_id: u64,
    /// Title
    pub title: String,
    /// Body
    pub description: Option<String>,
    /// Current state
    pub state: IssueState,
    /// Author
    pub author: Option<User>,
    /// Assignee
    pub assignee: Option<User>,
    /// Web URL
    pub web_url: String,
}

/// Merge request / pull request state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeRequestState {
    /// Open and mergeable in principle
    Opened,
    /// Closed without merging
    Closed,
    /// Merged
    Merged,
}

impl MergeRequestState {
    /// Map a GitLab state string (`locked` counts as closed)
    pub fn from_gitlab(state: &str) -> Self {
        match state {
            "opened" | "reopened" => Self::Opened,
            "merged" => Self::Merged,
            _ => Self::Closed,
        }
    }
}

impl std::fmt::Display for MergeRequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Opened => write!(f, "opened"),
            Self::Closed => write!(f, "closed"),
            Self::Merged => write!(f, "merged"),
        }
    }
}

/// A merge request (pull request on GitHub)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeRequest {
    /// Platform-wide id
    pub id: u64,
    /// Per-project display id
    pub iid: u64,
    /// Title
    pub title: String,
    /// Source branch
    pub source_branch: String,
    /// Target branch
    pub target_branch: String,
    /// Current state
    pub state: MergeRequestState,
    /// Author
    pub author: Option<User>,
    /// Assignee
    pub assignee: Option<User>,
    /// Creation time
    pub created_at: Option<DateTime<Utc>>,
    /// Web URL
    pub web_url: String,
}

/// Parameters for creating a merge request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMergeRequest {
    /// Source branch
    pub source_branch: String,
    /// Target branch
    pub target_branch: String,
    /// Title
    pub title: String,
    /// Assignee user id
    pub assignee_id: Option<u64>,
}

/// A comment on a merge request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    /// Comment id
    pub id: u64,
    /// Author
    pub author: Option<User>,
    /// Comment text
    pub body: String,
}

/// A group (organization on GitHub)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Group id
    pub id: u64,
    /// Group name
    pub name: String,
    /// Full path
    pub path: String,
}

/// A project listed under a group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupProject {
    /// SSH clone URL
    pub ssh_url: String,
    /// Project description
    pub description: Option<String>,
}

//! User configuration
//!
//! Settings live in a TOML file, by default
//! `<config_dir>/patchflow/config.toml`.

mod storage;

pub use storage::{CONFIG_FILE, default_settings_path, load_settings, save_settings};

use crate::git::DEFAULT_REMOTE;
use crate::types::Platform;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_remote() -> String {
    DEFAULT_REMOTE.to_string()
}

/// Persisted settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Hosting platform
    #[serde(default)]
    pub platform: Platform,
    /// API server address; required for GitLab, optional for GitHub
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// Access token (`PATCHFLOW_TOKEN` takes precedence)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Group (organization) whose members and projects are listed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Proxy for API calls and git network operations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    /// Remote project URLs never reported as missing locally
    #[serde(default)]
    pub ignore_repositories: Vec<String>,
    /// Git remote name
    #[serde(default = "default_remote")]
    pub remote: String,
    /// Overrides the default branch detected from the remote
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    /// Local checkouts operated on by `--all` commands
    #[serde(default)]
    pub repositories: Vec<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            platform: Platform::default(),
            api_url: None,
            token: None,
            group: None,
            proxy: None,
            ignore_repositories: Vec::new(),
            remote: default_remote(),
            default_branch: None,
            repositories: Vec::new(),
        }
    }
}

impl Settings {
    /// Whether a remote project URL is on the ignore list
    pub fn is_ignored(&self, url: &str) -> bool {
        self.ignore_repositories.iter().any(|ignored| ignored == url)
    }
}

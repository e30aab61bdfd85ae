//! Shared command context for CLI commands
//!
//! Extracts common setup code: settings, the repository handle and the
//! platform service.

use crate::cli::style::{Stylize, spinner_style};
use indicatif::ProgressBar;
use patchflow::auth::resolve_token;
use patchflow::config::{Settings, default_settings_path, load_settings};
use patchflow::error::Result;
use patchflow::git::RepositoryHandle;
use patchflow::platform::{PlatformService, create_platform_service, project_path_from_remote};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Resolve the settings file location
pub fn settings_path(explicit: Option<&Path>) -> Result<PathBuf> {
    explicit.map_or_else(default_settings_path, |p| Ok(p.to_path_buf()))
}

/// Open the repository at `path` configured from `settings`
pub fn open_repository(settings: &Settings, path: &Path) -> Result<RepositoryHandle> {
    Ok(RepositoryHandle::open(path)?
        .with_remote(settings.remote.clone())
        .with_default_branch(settings.default_branch.clone())
        .with_proxy(settings.proxy.as_deref()))
}

/// Shared context for CLI commands that interact with the platform
pub struct CommandContext {
    /// Loaded settings
    pub settings: Settings,
    /// The repository commands operate on
    pub repo: RepositoryHandle,
    /// Platform service (GitLab/GitHub)
    pub platform: Box<dyn PlatformService>,
}

impl CommandContext {
    /// Create a new command context
    ///
    /// - Load settings
    /// - Open the repository and read its remote URL
    /// - Resolve the token and connect to the platform
    pub async fn new(path: &Path, config: Option<&Path>) -> Result<Self> {
        let settings = load_settings(&settings_path(config)?)?;
        let repo = open_repository(&settings, path)?;

        let remote_url = repo.remote_url()?;
        let project_path = project_path_from_remote(&remote_url)?;
        debug!(%remote_url, %project_path, "detected project");

        let auth = resolve_token(&settings)?;
        debug!(source = ?auth.source, "resolved token");

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(spinner_style());
        spinner.set_message(format!(
            "Connecting to {} project {}...",
            settings.platform,
            project_path.emphasis()
        ));
        spinner.enable_steady_tick(Duration::from_millis(80));

        let platform = create_platform_service(&settings, auth.token, &project_path).await;
        match &platform {
            Ok(_) => spinner.finish_and_clear(),
            Err(_) => spinner.abandon_with_message(format!(
                "Could not connect to {}",
                project_path.emphasis()
            )),
        }

        Ok(Self {
            settings,
            repo,
            platform: platform?,
        })
    }
}

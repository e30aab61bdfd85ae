//! Platform service factory

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::platform::{GitHubService, GitLabService, PlatformService};
use crate::types::Platform;

/// Create the platform service selected by `settings.platform`, bound to
/// `project_path`.
pub async fn create_platform_service(
    settings: &Settings,
    token: String,
    project_path: &str,
) -> Result<Box<dyn PlatformService>> {
    let proxy = settings.proxy.as_deref();
    match settings.platform {
        Platform::GitLab => {
            let api_url = settings.api_url.as_deref().ok_or_else(|| {
                Error::Config("api_url must be set for the gitlab platform".to_string())
            })?;
            let service = GitLabService::connect(token, api_url, project_path, proxy).await?;
            Ok(Box::new(service))
        }
        Platform::GitHub => {
            let service =
                GitHubService::connect(token, settings.api_url.as_deref(), project_path, proxy)
                    .await?;
            Ok(Box::new(service))
        }
    }
}

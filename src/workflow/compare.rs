//! Remote projects that have no local checkout

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::GroupProject;
use tracing::debug;

/// Projects of the configured group whose clone URL matches none of
/// `local_urls` and is not on the ignore list.
pub async fn missing_projects(
    platform: &dyn PlatformService,
    settings: &Settings,
    local_urls: &[String],
) -> Result<Vec<GroupProject>> {
    let group = settings
        .group
        .as_deref()
        .ok_or_else(|| Error::Config("no 'group' configured".to_string()))?;

    let projects = platform.list_group_projects(group).await?;
    debug!(group, remote = projects.len(), local = local_urls.len(), "comparing projects");
    Ok(projects
        .into_iter()
        .filter(|p| !local_urls.contains(&p.ssh_url) && !settings.is_ignored(&p.ssh_url))
        .collect())
}

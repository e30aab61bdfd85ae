//! Repository maintenance commands

use crate::cli::context::{CommandContext, open_repository, settings_path};
use crate::cli::finish;
use crate::cli::render::{print_error, print_repo_status};
use crate::cli::style::{Stylize, link};
use anstream::println;
use patchflow::config::{Settings, load_settings};
use patchflow::error::{Error, Result};
use patchflow::git::{
    RepositoryHandle, change_or_create_branch, checkout_branch, prune_remote, remote_diff,
    repo_status, sync_default_branch,
};
use patchflow::report::Report;
use patchflow::workflow::missing_projects;
use std::path::Path;
use tracing::debug;

/// Settings for commands that work without a settings file
fn settings_or_default(config: Option<&Path>) -> Result<Settings> {
    let path = settings_path(config)?;
    if path.exists() {
        load_settings(&path)
    } else {
        debug!(path = %path.display(), "no settings file, using defaults");
        Ok(Settings::default())
    }
}

/// The current repository, or every configured one with `all`
fn repositories(
    settings: &Settings,
    path: &Path,
    all: bool,
) -> Result<Vec<Result<RepositoryHandle>>> {
    if !all {
        return Ok(vec![open_repository(settings, path)]);
    }
    if settings.repositories.is_empty() {
        return Err(Error::Config(
            "no 'repositories' configured for --all".to_string(),
        ));
    }
    Ok(settings
        .repositories
        .iter()
        .map(|p| open_repository(settings, p))
        .collect())
}

/// Run `op` on each repository; failures of one repository do not stop the rest
fn for_each_repository(
    settings: &Settings,
    path: &Path,
    all: bool,
    mut op: impl FnMut(&RepositoryHandle) -> Result<()>,
) -> Result<i32> {
    let targets = repositories(settings, path, all)?;
    if !all {
        let repo = targets.into_iter().next().ok_or_else(|| {
            Error::Internal("no repository to operate on".to_string())
        })??;
        op(&repo)?;
        return Ok(0);
    }

    let mut code = 0;
    for repo in targets {
        if let Err(e) = repo.and_then(|r| op(&r)) {
            print_error(&e);
            code = code.max(e.exit_code());
        }
    }
    Ok(code)
}

/// Show branch and divergence status
pub fn run_status(path: &Path, config: Option<&Path>, all: bool) -> Result<i32> {
    let settings = settings_or_default(config)?;
    for_each_repository(&settings, path, all, |repo| {
        print_repo_status(&repo_status(repo)?);
        Ok(())
    })
}

/// Fast-forward default branches
pub fn run_sync(path: &Path, config: Option<&Path>, all: bool) -> Result<i32> {
    let settings = settings_or_default(config)?;
    for_each_repository(&settings, path, all, |repo| {
        finish(&sync_default_branch(repo)?);
        Ok(())
    })
}

fn run_single(
    path: &Path,
    config: Option<&Path>,
    op: impl FnOnce(&RepositoryHandle) -> Result<Report>,
) -> Result<i32> {
    let settings = settings_or_default(config)?;
    let repo = open_repository(&settings, path)?;
    Ok(finish(&op(&repo)?))
}

/// Prune stale remote tracking refs
pub fn run_prune(path: &Path, config: Option<&Path>) -> Result<i32> {
    run_single(path, config, prune_remote)
}

/// List or switch branches
pub fn run_branch(path: &Path, config: Option<&Path>, name: Option<&str>) -> Result<i32> {
    run_single(path, config, |repo| change_or_create_branch(repo, name))
}

/// Check out a branch
pub fn run_checkout(path: &Path, config: Option<&Path>, name: Option<&str>) -> Result<i32> {
    run_single(path, config, |repo| checkout_branch(repo, name))
}

/// Diff against the remote default branch
pub fn run_remote_diff(path: &Path, config: Option<&Path>) -> Result<i32> {
    run_single(path, config, remote_diff)
}

/// List group projects with no local checkout
pub async fn run_compare_remote(path: &Path, config: Option<&Path>) -> Result<i32> {
    let ctx = CommandContext::new(path, config).await?;

    let mut local_urls = vec![ctx.repo.remote_url()?];
    for repo_path in &ctx.settings.repositories {
        match open_repository(&ctx.settings, repo_path).and_then(|r| r.remote_url()) {
            Ok(url) => local_urls.push(url),
            Err(e) => debug!(path = %repo_path.display(), error = %e, "skipping repository"),
        }
    }

    let missing = missing_projects(ctx.platform.as_ref(), &ctx.settings, &local_urls).await?;
    println!(
        "{}",
        "This list may include projects that are intentionally not checked out.".warn()
    );
    if missing.is_empty() {
        println!("{}", "No missing repositories".muted());
    }
    for project in &missing {
        println!("{}", link(&project.ssh_url, &project.ssh_url).success());
        if let Some(description) = project.description.as_deref().filter(|d| !d.is_empty()) {
            println!("  {}", description.muted());
        }
    }
    Ok(0)
}

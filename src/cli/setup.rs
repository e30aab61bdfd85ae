//! `setup`: git identity and the settings file

use crate::cli::context::settings_path;
use crate::cli::style::{Stylize, check};
use anstream::println;
use clap::Args;
use dialoguer::{Input, Password};
use patchflow::config::{Settings, load_settings, save_settings};
use patchflow::error::{Error, Result};
use patchflow::git::{global_config, set_global_config};
use patchflow::types::Platform;

/// Options for `setup`; anything not given is asked for
#[derive(Debug, Clone, Args)]
pub struct SetupArgs {
    /// Git user.name
    #[arg(long)]
    pub name: Option<String>,
    /// Git user.email
    #[arg(long)]
    pub email: Option<String>,
    /// Hosting platform
    #[arg(long, value_parser = parse_platform)]
    pub platform: Option<Platform>,
    /// API server address
    #[arg(long)]
    pub api_url: Option<String>,
    /// Group (organization) name
    #[arg(long)]
    pub group: Option<String>,
    /// Access token
    #[arg(long)]
    pub token: Option<String>,
    /// Do not prompt; keep existing values for anything not given
    #[arg(long)]
    pub non_interactive: bool,
}

fn parse_platform(s: &str) -> std::result::Result<Platform, String> {
    match s.to_ascii_lowercase().as_str() {
        "gitlab" => Ok(Platform::GitLab),
        "github" => Ok(Platform::GitHub),
        other => Err(format!("unknown platform '{other}' (expected gitlab or github)")),
    }
}

fn prompt_error(e: dialoguer::Error) -> Error {
    Error::Internal(format!("Failed to read input: {e}"))
}

/// Ask for a value, offering `current` as the default
fn ask(
    prompt: &str,
    given: Option<String>,
    current: Option<String>,
    interactive: bool,
) -> Result<Option<String>> {
    if given.is_some() || !interactive {
        return Ok(given.or(current));
    }
    let mut input = Input::<String>::new().with_prompt(prompt).allow_empty(true);
    if let Some(current) = current {
        input = input.default(current);
    }
    let value = input.interact_text().map_err(prompt_error)?;
    let value = value.trim().to_string();
    Ok((!value.is_empty()).then_some(value))
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// Run setup
pub fn run_setup(config: Option<&std::path::Path>, args: SetupArgs) -> Result<i32> {
    let interactive = !args.non_interactive;
    let path = settings_path(config)?;
    let mut settings = if path.exists() {
        load_settings(&path)?
    } else {
        Settings::default()
    };

    let current_name = non_empty(global_config("user.name")?);
    let current_email = non_empty(global_config("user.email")?);
    let name = ask("Git user name", args.name, current_name, interactive)?;
    let email = ask("Git user email", args.email, current_email, interactive)?;
    if let Some(name) = name {
        set_global_config("user.name", &name)?;
    }
    if let Some(email) = email {
        set_global_config("user.email", &email)?;
    }

    if let Some(platform) = args.platform {
        settings.platform = platform;
    }
    settings.api_url = ask("API URL", args.api_url, settings.api_url.take(), interactive)?;
    settings.group = ask("Group", args.group, settings.group.take(), interactive)?;

    settings.token = match args.token {
        Some(token) => Some(token),
        None if interactive && settings.token.is_none() => {
            let token = Password::new()
                .with_prompt("Access token (empty to use PATCHFLOW_TOKEN)")
                .allow_empty_password(true)
                .interact()
                .map_err(prompt_error)?;
            non_empty(token)
        }
        None => settings.token.take(),
    };

    save_settings(&path, &settings)?;
    println!(
        "{} Settings written to {}",
        check(),
        path.display().to_string().accent()
    );
    Ok(0)
}

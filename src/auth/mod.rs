//! Authentication for GitHub and GitLab
//!
//! Tokens come from the `PATCHFLOW_TOKEN` environment variable or the
//! settings file, in that order.

use crate::config::Settings;
use crate::error::{Error, Result};
use tracing::debug;

/// Environment variable holding an access token
pub const TOKEN_ENV_VAR: &str = "PATCHFLOW_TOKEN";

/// Source of authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token from environment variable
    EnvVar,
    /// Token from the settings file
    Config,
}

/// A resolved token and where it came from
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Access token
    pub token: String,
    /// Where the token was found
    pub source: AuthSource,
}

/// Resolve the access token for API calls
pub fn resolve_token(settings: &Settings) -> Result<AuthConfig> {
    resolve_token_from(std::env::var(TOKEN_ENV_VAR).ok(), settings)
}

/// Resolve a token given the value of [`TOKEN_ENV_VAR`]
pub fn resolve_token_from(env_token: Option<String>, settings: &Settings) -> Result<AuthConfig> {
    if let Some(token) = env_token.as_deref().map(str::trim)
        && !token.is_empty()
    {
        debug!("using token from {TOKEN_ENV_VAR}");
        return Ok(AuthConfig {
            token: token.to_string(),
            source: AuthSource::EnvVar,
        });
    }

    if let Some(token) = settings.token.as_deref().map(str::trim)
        && !token.is_empty()
    {
        debug!("using token from settings");
        return Ok(AuthConfig {
            token: token.to_string(),
            source: AuthSource::Config,
        });
    }

    Err(Error::Auth(format!(
        "No {} token found. Set {TOKEN_ENV_VAR} or add 'token' to the settings file.",
        settings.platform
    )))
}

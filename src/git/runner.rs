//! Subprocess wrapper around the `git` executable

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Raw result of a git invocation
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Whether git exited with status 0
    pub success: bool,
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
    /// Standard output (lossy UTF-8)
    pub stdout: String,
    /// Standard error (lossy UTF-8)
    pub stderr: String,
}

impl CommandOutput {
    /// Whether this output counts as a failed command.
    ///
    /// git writes progress and hints to stderr on success, so only the
    /// combination of a nonzero exit and stderr text is a failure.
    pub fn is_failure(&self) -> bool {
        !self.success && !self.stderr.trim().is_empty()
    }
}

/// Run `git <args>` in `dir` and return the raw output.
///
/// `env` is merged over the inherited process environment. Only a failure to
/// spawn git is reported as an error; exit status is left to the caller.
pub fn run_git_output(
    dir: &Path,
    args: &[&str],
    env: &BTreeMap<String, String>,
) -> Result<CommandOutput> {
    debug!(dir = %dir.display(), args = ?args, "running git");

    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .envs(env)
        .output()
        .map_err(|e| Error::Command {
            command: args.join(" "),
            stderr: format!("failed to spawn git: {e}"),
        })?;

    let result = CommandOutput {
        success: output.status.success(),
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    debug!(code = ?result.code, "git finished");
    Ok(result)
}

/// Run `git <args>` in `dir` and return its standard output.
///
/// Fails with [`Error::Command`] when git exits nonzero and wrote to stderr.
pub fn run_git(dir: &Path, args: &[&str], env: &BTreeMap<String, String>) -> Result<String> {
    let output = run_git_output(dir, args, env)?;
    if output.is_failure() {
        return Err(Error::Command {
            command: args.join(" "),
            stderr: output.stderr.trim().to_string(),
        });
    }
    Ok(output.stdout)
}

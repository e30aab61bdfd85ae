//! Remote URL parsing

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

// scp-like syntax: [user@]host:path
static SCP_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[^@/]+@)?([^:/]+):(.+)$").expect("static regex is valid")
});

/// Extract the `group/project` path from a git remote URL.
///
/// Accepts `ssh://`, `git://`, `http(s)://` and scp-like `git@host:path`
/// forms. Strips a trailing `.git` and slashes.
pub fn project_path_from_remote(remote_url: &str) -> Result<String> {
    let remote_url = remote_url.trim();

    let raw_path = if remote_url.contains("://") {
        let url = Url::parse(remote_url)
            .map_err(|e| Error::Config(format!("invalid remote URL '{remote_url}': {e}")))?;
        url.path().to_string()
    } else if let Some(caps) = SCP_LIKE.captures(remote_url) {
        caps[2].to_string()
    } else {
        return Err(Error::Config(format!(
            "cannot derive a project path from remote '{remote_url}'"
        )));
    };

    let path = raw_path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path).trim_end_matches('/');

    if path.is_empty() || !path.contains('/') {
        return Err(Error::Config(format!(
            "remote '{remote_url}' does not name a group/project"
        )));
    }

    Ok(path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scp_like() {
        assert_eq!(
            project_path_from_remote("git@gitlab.example.com:salt/pillar-base.git").unwrap(),
            "salt/pillar-base"
        );
    }

    #[test]
    fn test_https() {
        assert_eq!(
            project_path_from_remote("https://gitlab.example.com/salt/states.git").unwrap(),
            "salt/states"
        );
    }

    #[test]
    fn test_ssh_scheme_with_port() {
        assert_eq!(
            project_path_from_remote("ssh://git@gitlab.example.com:2222/a/b/c.git").unwrap(),
            "a/b/c"
        );
    }

    #[test]
    fn test_trailing_slashes_and_no_suffix() {
        assert_eq!(
            project_path_from_remote("https://github.com/owner/repo//").unwrap(),
            "owner/repo"
        );
    }

    #[test]
    fn test_local_path_rejected() {
        assert!(matches!(
            project_path_from_remote("/srv/git/repo.git"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_single_segment_rejected() {
        assert!(project_path_from_remote("git@host:repo.git").is_err());
    }
}

//! Git layer
//!
//! Everything here shells out to the `git` executable through
//! [`runner`]. The interesting decisions live in [`state`] (divergence
//! classification) and [`probe`] (disposable trial merges).

mod maintenance;
mod probe;
mod repo;
mod runner;
mod state;

pub use maintenance::{
    RepoStatus, change_or_create_branch, checkout_branch, prune_remote, remote_diff, repo_status,
    sync_default_branch,
};
pub use probe::{TEMP_BRANCH_PREFIX, probe_mergeable, temp_branch_name};
pub use repo::{
    BranchSwitch, DEFAULT_REMOTE, FALLBACK_DEFAULT_BRANCH, RepositoryHandle, global_config,
    set_global_config,
};
pub use runner::{CommandOutput, run_git, run_git_output};
pub use state::{
    Divergence, classify_divergence, is_branch_merged_upstream, is_commit_on_remote,
    is_working_tree_clean,
};

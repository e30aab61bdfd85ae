//! Command-line interface
//!
//! Argument parsing and presentation. All decisions live in the library;
//! commands here gather settings, call one operation and render its result.

mod context;
mod issues;
mod patch;
mod render;
mod repos;
mod setup;
mod style;

use clap::{Parser, Subcommand};
use patchflow::error::Result;
use patchflow::report::{Level, Report};
use std::path::{Path, PathBuf};

pub use render::print_error;

/// Issue to merge request workflow for GitLab and GitHub repositories
#[derive(Debug, Parser)]
#[command(name = "patchflow", version, about, long_about = None)]
pub struct Cli {
    /// Settings file [default: <config dir>/patchflow/config.toml]
    #[arg(long, global = true, env = "PATCHFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Repository to operate on
    #[arg(long, short = 'C', global = true, default_value = ".")]
    pub path: PathBuf,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List issues of the current project
    #[command(alias = "li")]
    Issues {
        /// Include closed issues
        #[arg(long)]
        all: bool,
    },
    /// List issues assigned to you
    #[command(alias = "mi")]
    MyIssues {
        /// Include closed issues
        #[arg(long)]
        all: bool,
    },
    /// List members of the configured group
    #[command(alias = "pm")]
    Members,
    /// List merge requests of the current project
    #[command(alias = "lm")]
    MergeRequests {
        /// Include closed and merged requests
        #[arg(long)]
        all: bool,
    },
    /// Show a merge request with its comments
    #[command(alias = "md")]
    MergeDetails {
        /// Merge request id
        id: String,
    },
    /// Create or switch to the branch for an issue
    #[command(alias = "wp")]
    StartPatch {
        /// Issue id
        issue_id: String,
    },
    /// Push the current issue branch and open a merge request
    #[command(alias = "cp")]
    CommitPatch {
        /// Assignee user id
        assignee: Option<String>,
        /// Merge request title [default: last commit subject]
        title: Option<String>,
    },
    /// Trial-merge and accept a merge request
    #[command(alias = "am")]
    AcceptMerge {
        /// Merge request id
        id: String,
        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },
    /// Close an issue
    #[command(alias = "ci")]
    CloseIssue {
        /// Issue id
        id: String,
    },
    /// Reopen an issue
    #[command(alias = "ri")]
    ReopenIssue {
        /// Issue id
        id: String,
    },
    /// Show branch and divergence status
    Status {
        /// All configured repositories
        #[arg(long)]
        all: bool,
    },
    /// Fast-forward the default branch from the remote
    Sync {
        /// All configured repositories
        #[arg(long)]
        all: bool,
    },
    /// Remove stale remote tracking branches
    Prune,
    /// List branches, or switch to/create one
    Branch {
        /// Branch to switch to or create
        name: Option<String>,
    },
    /// Check out a branch [default: the default branch]
    Checkout {
        /// Branch to check out
        name: Option<String>,
    },
    /// Diff the local default branch against the remote
    RemoteDiff,
    /// List group projects without a local checkout
    CompareRemote,
    /// Configure git identity and write the settings file
    Setup(setup::SetupArgs),
}

/// Print a report and derive the exit code from its worst message
fn finish(report: &Report) -> i32 {
    render::print_report(report);
    i32::from(report.max_level() == Some(Level::Failure))
}

/// Run the parsed command, returning the process exit code
pub async fn run(cli: Cli) -> Result<i32> {
    let path: &Path = &cli.path;
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Issues { all } => issues::run_issues(path, config, all).await,
        Commands::MyIssues { all } => issues::run_my_issues(path, config, all).await,
        Commands::Members => issues::run_members(path, config).await,
        Commands::CloseIssue { id } => {
            issues::run_set_state(path, config, &id, patchflow::types::IssueAction::Close).await
        }
        Commands::ReopenIssue { id } => {
            issues::run_set_state(path, config, &id, patchflow::types::IssueAction::Reopen).await
        }
        Commands::MergeRequests { all } => patch::run_merge_requests(path, config, all).await,
        Commands::MergeDetails { id } => patch::run_merge_details(path, config, &id).await,
        Commands::StartPatch { issue_id } => patch::run_start_patch(path, config, &issue_id).await,
        Commands::CommitPatch { assignee, title } => {
            patch::run_commit_patch(path, config, assignee, title).await
        }
        Commands::AcceptMerge { id, yes } => patch::run_accept_merge(path, config, &id, yes).await,
        Commands::Status { all } => repos::run_status(path, config, all),
        Commands::Sync { all } => repos::run_sync(path, config, all),
        Commands::Prune => repos::run_prune(path, config),
        Commands::Branch { name } => repos::run_branch(path, config, name.as_deref()),
        Commands::Checkout { name } => repos::run_checkout(path, config, name.as_deref()),
        Commands::RemoteDiff => repos::run_remote_diff(path, config),
        Commands::CompareRemote => repos::run_compare_remote(path, config).await,
        Commands::Setup(args) => setup::run_setup(config, args),
    }
}

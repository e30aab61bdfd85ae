//! Rendering of reports, errors and platform objects

use crate::cli::style::{Stylize, check, link};
use anstream::{eprintln, println};
use patchflow::error::Error;
use patchflow::git::RepoStatus;
use patchflow::report::{Level, Report};
use patchflow::types::{Issue, MergeRequest, Note, User};

const RULE_WIDTH: usize = 80;

fn styled(level: Level, text: &str) -> String {
    match level {
        Level::Info => text.to_string(),
        Level::Success => format!("{} {}", check(), text.success()),
        Level::Warning => text.warn(),
        Level::Failure => text.error(),
    }
}

/// Print every message of a report
pub fn print_report(report: &Report) {
    for message in &report.messages {
        println!("{}", styled(message.level, &message.text));
    }
}

/// Print a terminal error with its hint
pub fn print_error(err: &Error) {
    eprintln!("{}", styled(err.level(), &format!("Error: {err}")));
    if let Some(hint) = err.hint() {
        eprintln!("{}", hint.muted());
    }
}

fn rule() {
    println!("{}", "-".repeat(RULE_WIDTH).muted());
}

fn user_name(user: Option<&User>) -> &str {
    user.map_or("-", |u| u.name.as_str())
}

/// Print an issue block
pub fn print_issue(issue: &Issue) {
    println!("{} {}", "TITLE:".emphasis(), issue.title);
    println!("ID: {}", issue.iid.to_string().accent());
    println!("URL: {}", link(&issue.web_url, &issue.web_url));
    if let Some(description) = issue.description.as_deref().filter(|d| !d.is_empty()) {
        println!("WHAT: {description}");
    }
    println!("STATE: {}", issue.state);
    println!("AUTHOR: {}", user_name(issue.author.as_ref()));
    if let Some(assignee) = &issue.assignee {
        println!("ASSIGNEE: {}", assignee.name.success());
    }
    rule();
}

/// Print a merge request block
pub fn print_merge_request(mr: &MergeRequest) {
    println!("{} {}", "TITLE:".emphasis(), mr.title);
    println!("ID: {}", mr.iid.to_string().accent());
    println!(
        "BRANCH: {} -> {}",
        mr.source_branch.accent(),
        mr.target_branch.accent()
    );
    println!("STATE: {}", mr.state);
    println!("AUTHOR: {}", user_name(mr.author.as_ref()));
    if let Some(assignee) = &mr.assignee {
        println!("ASSIGNEE: {}", assignee.name.success());
    }
    if let Some(created_at) = mr.created_at {
        println!("DATE: {}", created_at.format("%Y-%m-%d %H:%M"));
    }
    if !mr.web_url.is_empty() {
        println!("URL: {}", link(&mr.web_url, &mr.web_url));
    }
    rule();
}

/// Print merge request comments
pub fn print_notes(notes: &[Note]) {
    println!("{}", "COMMENTS:".emphasis());
    if notes.is_empty() {
        println!("{}", "No comments".muted());
    }
    for note in notes {
        println!("{}:", user_name(note.author.as_ref()).success());
        println!("{}", note.body);
        println!("{}", "-".repeat(40).muted());
    }
}

/// Print a member line
pub fn print_member(user: &User) {
    println!(
        "{} ({}) ID: {}",
        user.name,
        user.username.muted(),
        user.id.to_string().accent()
    );
}

/// Print a repository status line
pub fn print_repo_status(status: &RepoStatus) {
    let state = if status.clean {
        "clean".success()
    } else {
        "dirty".warn()
    };
    let merged = match status.merged {
        Some(true) => format!(" {}", "merged".success()),
        Some(false) => format!(" {}", "unmerged".warn()),
        None => String::new(),
    };
    println!(
        "{} [{}] {} {}{}",
        status.path.emphasis(),
        status.branch.accent(),
        state,
        status.divergence,
        merged
    );
    if let Some(change) = &status.changes {
        println!("  {}", change.muted());
    }
    let others: Vec<&str> = status
        .branches
        .iter()
        .map(String::as_str)
        .filter(|b| *b != status.branch)
        .collect();
    if !others.is_empty() {
        println!("  {} {}", "branches:".muted(), others.join(", ").muted());
    }
}

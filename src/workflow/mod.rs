//! The issue -> branch -> merge request workflow
//!
//! Each operation re-derives where the patch stands from git and the
//! platform; nothing is cached between invocations. Operations return a
//! [`Report`](crate::report::Report) and leave presentation to the caller.
//!
//! `submit_patch` follows the gather/plan/execute split: facts are collected
//! first, [`plan_submission`] decides (pure), then the plan is carried out.

mod accept;
mod compare;
mod issue;
mod plan;
mod start;
mod submit;

pub use accept::accept_merge;
pub use compare::missing_projects;
pub use issue::set_issue_state;
pub use plan::{MergeRequestAction, PushAction, SubmissionFacts, SubmissionPlan, plan_submission};
pub use start::start_patch;
pub use submit::{SubmitOptions, SubmitOutcome, submit_patch};

use crate::error::{Error, Result};

/// Comment posted on a merge request whose trial merge conflicted
pub const CONFLICT_COMMENT: &str = "Could not be merged due to CONFLICTs";

/// Branch name used for work on an issue
pub fn issue_branch_name(issue_id: u64) -> String {
    format!("issue_{issue_id}")
}

/// Parse a user supplied issue or merge request id.
///
/// Only positive decimal integers are accepted.
pub fn parse_id(raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(Error::Validation(format!(
            "ID must be a positive integer, got '{raw}'"
        ))),
    }
}

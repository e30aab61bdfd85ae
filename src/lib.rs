//! patchflow - issue to branch to merge request workflow
//!
//! Wraps the local `git` executable and a GitLab or GitHub API to run a
//! fixed workflow: start a branch for an issue, submit it as a merge
//! request, and accept merge requests only after a local trial merge shows
//! they merge cleanly.
//!
//! The heart of the crate is [`git`]: working tree and divergence
//! classification plus the disposable trial merge. [`workflow`] composes it
//! with a [`platform::PlatformService`].

pub mod auth;
pub mod config;
pub mod error;
pub mod git;
pub mod platform;
pub mod report;
pub mod types;
pub mod workflow;

pub use error::{Error, Result};

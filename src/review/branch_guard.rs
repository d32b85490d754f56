//! Refuse commits on protected branches.

use crate::core::git;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchStatus {
    /// Not inside a git repository, or HEAD is detached.
    NoBranch,
    Working(String),
    Protected(String),
}

pub fn classify(branch: Option<&str>, protected: &[String]) -> BranchStatus {
    match branch {
        None => BranchStatus::NoBranch,
        Some(b) if protected.iter().any(|p| p == b) => BranchStatus::Protected(b.to_string()),
        Some(b) => BranchStatus::Working(b.to_string()),
    }
}

pub fn check(dir: &Path, protected: &[String]) -> BranchStatus {
    let branch = git::current_branch(dir);
    let status = classify(branch.as_deref(), protected);
    tracing::debug!(?status, "branch guard");
    status
}

pub fn guidance(branch: &str) -> String {
    format!(
        "branch-guard: refusing to commit directly to protected branch '{}'\n  \
         create a working branch first: git switch -c feature/<topic>",
        branch
    )
}

//! Thin wrappers over the `git` executable.

use crate::core::error::PkgsmithError;
use std::path::{Path, PathBuf};
use std::process::Command;

pub fn run_tool(program: &str, cwd: &Path, args: &[&str]) -> Result<String, PkgsmithError> {
    tracing::debug!(program, ?args, cwd = %cwd.display(), "running");
    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .output()
        .map_err(|e| PkgsmithError::VcsError(format!("{} failed: {}", program, e)))?;

    if !output.status.success() {
        return Err(PkgsmithError::VcsError(format!(
            "{} {} failed: {}",
            program,
            args.first().copied().unwrap_or_default(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

pub fn run_git(cwd: &Path, args: &[&str]) -> Result<String, PkgsmithError> {
    run_tool("git", cwd, args)
}

/// Current branch of the repository containing `dir`; `None` outside a
/// repository or on a detached HEAD.
pub fn current_branch(dir: &Path) -> Option<String> {
    run_git(dir, &["branch", "--show-current"])
        .ok()
        .filter(|b| !b.is_empty())
}

/// Files added, copied, or modified in the index, relative to the repository root.
pub fn staged_files(dir: &Path) -> Result<(PathBuf, Vec<PathBuf>), PkgsmithError> {
    let root = PathBuf::from(run_git(dir, &["rev-parse", "--show-toplevel"])?);
    let listing = run_git(
        dir,
        &["diff", "--cached", "--name-only", "--diff-filter=ACM"],
    )?;
    let files = listing
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(PathBuf::from)
        .collect();
    Ok((root, files))
}

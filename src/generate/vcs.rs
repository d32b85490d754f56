//! Version-control collaborator invoked after a package is written.
//!
//! The generator only decides *when* these run; how a repository is created
//! or published belongs to `git` and `gh`.

use crate::core::error::PkgsmithError;
use crate::core::git::{run_git, run_tool};
use std::path::Path;

pub const INITIAL_BRANCH: &str = "main";
pub const INITIAL_COMMIT_MESSAGE: &str = "feat: initial package setup";

pub trait VersionControl {
    /// Initialize a repository at `root` and commit everything in it.
    fn init_repository(&self, root: &Path) -> Result<(), PkgsmithError>;

    /// Publish `root` as `<owner>/<name>`; returns the remote URL.
    fn register_remote(&self, root: &Path, owner: &str, name: &str)
    -> Result<String, PkgsmithError>;
}

/// Shells out to the `git` and `gh` executables.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitCli;

impl VersionControl for GitCli {
    fn init_repository(&self, root: &Path) -> Result<(), PkgsmithError> {
        let branch_flag = format!("--initial-branch={}", INITIAL_BRANCH);
        run_git(root, &["init", &branch_flag])?;
        run_git(root, &["add", "-A"])?;
        run_git(
            root,
            &["commit", "-m", INITIAL_COMMIT_MESSAGE, "--no-verify"],
        )?;
        Ok(())
    }

    fn register_remote(
        &self,
        root: &Path,
        owner: &str,
        name: &str,
    ) -> Result<String, PkgsmithError> {
        let slug = format!("{}/{}", owner, name);
        run_tool(
            "gh",
            root,
            &["repo", "create", &slug, "--public", "--source=.", "--push"],
        )?;
        // Best effort: the repository exists even if this fails.
        if let Err(e) = run_tool(
            "gh",
            root,
            &["repo", "edit", &slug, "--default-branch", INITIAL_BRANCH],
        ) {
            tracing::warn!(error = %e, "could not set default branch");
        }
        Ok(format!("https://github.com/{}", slug))
    }
}

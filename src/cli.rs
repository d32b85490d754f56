//! CLI struct definitions for the pkgsmith command-line interface.
//!
//! All clap-derived types live here. Dispatch logic lives in `lib.rs`.

use crate::review::ReportFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "pkgsmith",
    version = env!("CARGO_PKG_VERSION"),
    about = "Generate monorepo Python packages and review changes before they are committed."
)]
pub(crate) struct Cli {
    /// Conventions file. Defaults to `pkgsmith.toml` in the working directory, if present.
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Create a new package from the template set
    New(NewCli),
    /// Review changed files against the repository rules
    Review(ReviewCli),
    /// Fail when the current branch is protected
    BranchGuard,
}

#[derive(clap::Args, Debug)]
pub(crate) struct NewCli {
    /// Package name, e.g. `billing-core`
    pub name: String,
    /// One-line package description
    pub description: String,
    /// Skip `git init` and the initial commit
    #[clap(long)]
    pub no_git: bool,
    /// Create and push a GitHub repository with `gh`
    #[clap(long)]
    pub github: bool,
    /// GitHub user or organisation owning the repository
    #[clap(long)]
    pub user: Option<String>,
    /// Write into an existing non-empty directory
    #[clap(long)]
    pub force: bool,
    /// Print what would be written without touching the disk
    #[clap(long)]
    pub dry_run: bool,
    /// Parent directory for the new package
    #[clap(long)]
    pub packages_dir: Option<PathBuf>,
    /// Template set directory (falls back to the embedded set)
    #[clap(long)]
    pub templates: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub(crate) struct ReviewCli {
    /// Files to review. Without paths the staged changes are reviewed.
    pub paths: Vec<PathBuf>,
    /// Review the files staged in git
    #[clap(long, conflicts_with = "paths")]
    pub staged: bool,
    /// Output format
    #[clap(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
    /// List the registered roles and exit
    #[clap(long)]
    pub list_roles: bool,
}

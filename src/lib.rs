//! pkgsmith: package generator and pre-commit reviewer for a Python monorepo.
//!
//! Two halves share one set of [`core::config::Conventions`]:
//!
//! - **Generation** (`pkgsmith new`): validates a package name, derives the
//!   parameters every template needs, renders the template set, and writes
//!   the package skeleton. Nothing touches the disk until every template has
//!   rendered.
//! - **Review** (`pkgsmith review`): runs a fixed registry of independent
//!   roles (structure, debug, tester, docs, security, architecture) over the
//!   changed files and aggregates their violations into one report. The
//!   review fails only when an error-severity violation is found.
//!
//! `pkgsmith branch-guard` is the companion pre-commit hook that refuses
//! commits on protected branches.
//!
//! # Examples
//!
//! ```bash
//! pkgsmith new billing-core "Billing domain services"
//! pkgsmith review --staged
//! pkgsmith review src/billing_core/services/__init__.py --format json
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: configuration, errors, embedded templates, git plumbing
//! - [`generate`]: parameter resolution, rendering, scaffold writing
//! - [`review`]: lexer, roles, engine, report

pub mod core;
pub mod generate;
pub mod review;

mod cli;

use clap::Parser;
use cli::{Cli, Command, NewCli, ReviewCli};
use colored::Colorize;
use crate::core::config::Conventions;
use crate::core::error::PkgsmithError;
use crate::generate::NewPackageRequest;
use crate::generate::template_set::TemplateSource;
use crate::generate::vcs::GitCli;
use crate::review::branch_guard::{self, BranchStatus};
use crate::review::{ReportFormat, Reviewer};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter (`tracing_subscriber::EnvFilter` syntax).
pub const LOG_ENV: &str = "PKGSMITH_LOG";

/// Install the stderr log subscriber. Defaults to `warn`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

pub fn run() -> Result<(), PkgsmithError> {
    let cli = Cli::parse();
    let current_dir = std::env::current_dir()?;
    let conventions = match &cli.config {
        Some(path) => Conventions::from_path(path)?,
        None => Conventions::discover(&current_dir)?,
    };
    tracing::debug!(cwd = %current_dir.display(), "conventions loaded");

    match cli.command {
        Command::New(args) => run_new(args, &conventions, &current_dir),
        Command::Review(args) => run_review(args, &conventions, &current_dir),
        Command::BranchGuard => run_branch_guard(&conventions, &current_dir),
    }
}

fn run_new(args: NewCli, conventions: &Conventions, cwd: &Path) -> Result<(), PkgsmithError> {
    let generator = &conventions.generator;
    let packages_dir = args
        .packages_dir
        .unwrap_or_else(|| cwd.join(&generator.packages_dir));
    let templates = match args.templates {
        Some(dir) if dir.is_dir() => TemplateSource::Directory(dir),
        Some(dir) => {
            return Err(PkgsmithError::TemplateNotFound(dir.display().to_string()));
        }
        None => TemplateSource::locate(&cwd.join(&generator.templates_dir)),
    };

    let request = NewPackageRequest {
        name: args.name,
        description: args.description,
        packages_dir,
        templates,
        init_git: !args.no_git,
        create_remote: args.github,
        github_user: args.user.unwrap_or_else(|| generator.github_user.clone()),
        force: args.force,
        dry_run: args.dry_run,
    };

    let outcome = generate::create_package(&request, conventions, &GitCli)?;
    let root = outcome.summary.root.display().to_string();
    if outcome.summary.dry_run {
        println!("\n{} nothing was written to {}", "Dry run:".yellow().bold(), root);
        return Ok(());
    }

    println!(
        "\n{} Package '{}' created at {}",
        "✓".green().bold(),
        outcome.name.display,
        root
    );
    println!("\nNext steps:");
    println!("  cd {}", root);
    println!("  uv sync");
    println!("  pre-commit install");
    println!("  uv run pytest");
    Ok(())
}

fn run_review(args: ReviewCli, conventions: &Conventions, cwd: &Path) -> Result<(), PkgsmithError> {
    let reviewer = Reviewer::new(&conventions.review);
    if args.list_roles {
        for role in reviewer.registry().roles() {
            println!("{:<13} {}", role.name(), role.description());
        }
        return Ok(());
    }

    let (root, paths): (PathBuf, Vec<PathBuf>) = if args.staged || args.paths.is_empty() {
        crate::core::git::staged_files(cwd)?
    } else {
        (cwd.to_path_buf(), args.paths)
    };
    let files = review::load_sources(&root, &paths, &conventions.review.extensions)?;
    tracing::info!(files = files.len(), "reviewing");

    let report = reviewer.review(&files);
    match args.format {
        ReportFormat::Text => print!("{}", report.render_text(std::io::stdout().is_terminal())),
        ReportFormat::Json => println!("{}", report.render_json()?),
    }
    report.ensure_passed()
}

fn run_branch_guard(conventions: &Conventions, cwd: &Path) -> Result<(), PkgsmithError> {
    match branch_guard::check(cwd, &conventions.review.protected_branches) {
        BranchStatus::Protected(branch) => {
            eprintln!("{}", branch_guard::guidance(&branch));
            Err(PkgsmithError::ValidationError(format!(
                "commits to '{}' are not allowed",
                branch
            )))
        }
        BranchStatus::Working(_) | BranchStatus::NoBranch => Ok(()),
    }
}

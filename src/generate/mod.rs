//! Package generation: resolve parameters, render the template set, write
//! the scaffold, then hand the result to version control.
//!
//! Everything that can fail on bad input (name validation, placeholder
//! resolution, template syntax) happens before the first byte is written.

pub mod params;
pub mod render;
pub mod scaffold;
pub mod template_set;
pub mod vcs;

use crate::core::config::Conventions;
use crate::core::error::PkgsmithError;
use params::PackageName;
use scaffold::{ScaffoldOptions, ScaffoldSummary};
use std::path::PathBuf;
use template_set::{TemplateSet, TemplateSource};
use vcs::VersionControl;

/// Everything `pkgsmith new` was asked to do.
#[derive(Debug, Clone)]
pub struct NewPackageRequest {
    pub name: String,
    pub description: String,
    /// Parent directory; the package lands in `<packages_dir>/<display name>`.
    pub packages_dir: PathBuf,
    pub templates: TemplateSource,
    pub init_git: bool,
    pub create_remote: bool,
    pub github_user: String,
    pub force: bool,
    pub dry_run: bool,
}

#[derive(Debug)]
pub struct PackageOutcome {
    pub name: PackageName,
    pub summary: ScaffoldSummary,
    pub git_initialized: bool,
    pub remote_url: Option<String>,
}

pub fn create_package(
    request: &NewPackageRequest,
    conventions: &Conventions,
    vcs: &dyn VersionControl,
) -> Result<PackageOutcome, PkgsmithError> {
    if request.create_remote && !request.init_git {
        return Err(PkgsmithError::ValidationError(
            "--github needs a git repository; drop --no-git".to_string(),
        ));
    }

    let (name, ctx) = params::resolve(&request.name, &request.description, &conventions.generator)?;
    let set = TemplateSet::load(&request.templates)?;
    let files = render::render_set(&set, &ctx)?;
    let layout = conventions
        .layout
        .directories
        .iter()
        .map(|dir| render::render_path("layout.directories", dir, &ctx))
        .collect::<Result<Vec<_>, _>>()?;

    println!("Creating package: {}", name.display);
    println!("  Module name: {}", name.identifier);
    match set.description() {
        Some(about) => println!("  Template set: {} ({})", set.name(), about),
        None => println!("  Template set: {}", set.name()),
    }

    let opts = ScaffoldOptions {
        target_dir: request.packages_dir.join(&name.display),
        force: request.force,
        dry_run: request.dry_run,
    };
    let summary = scaffold::write_scaffold(&files, &layout, &opts)?;

    let mut outcome = PackageOutcome {
        name,
        summary,
        git_initialized: false,
        remote_url: None,
    };
    if request.dry_run || !request.init_git {
        return Ok(outcome);
    }

    vcs.init_repository(&outcome.summary.root)?;
    outcome.git_initialized = true;
    println!("  Git initialized with initial commit (branch: {})", vcs::INITIAL_BRANCH);

    if request.create_remote {
        match vcs.register_remote(&outcome.summary.root, &request.github_user, &outcome.name.display) {
            Ok(url) => {
                println!("  Remote repository created: {}", url);
                outcome.remote_url = Some(url);
            }
            Err(e) => {
                tracing::warn!(error = %e, "remote registration failed");
                println!("  Warning: could not create remote repository: {}", e);
                println!("  Package created locally without a remote");
            }
        }
    }

    Ok(outcome)
}

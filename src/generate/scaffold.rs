//! Scaffold writing for new packages.
//!
//! Writes rendered files into the package directory in template-set order.
//!
//! - **Never writes over existing work**: a non-empty target requires `force`
//! - **Dry-run mode available**: prints what would be written, touches nothing
//! - **No rollback**: a failed write reports every file already materialized

use crate::core::error::PkgsmithError;
use crate::generate::render::GeneratedFile;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Scaffold operation configuration.
pub struct ScaffoldOptions {
    /// Package root that receives the files.
    pub target_dir: PathBuf,
    /// Write into a non-empty target, overwriting files with the same path.
    pub force: bool,
    /// Preview mode - report actions without writing files
    pub dry_run: bool,
}

/// What a scaffold run produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScaffoldSummary {
    pub root: PathBuf,
    pub directories: Vec<PathBuf>,
    pub written: Vec<PathBuf>,
    pub dry_run: bool,
}

fn is_non_empty_dir(path: &Path) -> Result<bool, PkgsmithError> {
    let mut entries = fs::read_dir(path).map_err(PkgsmithError::IoError)?;
    Ok(entries.next().is_some())
}

fn check_target(opts: &ScaffoldOptions) -> Result<(), PkgsmithError> {
    let dest = &opts.target_dir;
    if !dest.exists() {
        return Ok(());
    }
    if !dest.is_dir() {
        return Err(PkgsmithError::TargetExists(dest.clone()));
    }
    if is_non_empty_dir(dest)? && !opts.force {
        return Err(PkgsmithError::TargetExists(dest.clone()));
    }
    Ok(())
}

fn failed(path: PathBuf, written: &[PathBuf], source: io::Error) -> PkgsmithError {
    PkgsmithError::WriteFailed {
        path,
        written: written.to_vec(),
        source,
    }
}

fn write_file(dest: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(dest, content)
}

/// Create the layout directories, then write `files` in order.
pub fn write_scaffold(
    files: &[GeneratedFile],
    layout: &[PathBuf],
    opts: &ScaffoldOptions,
) -> Result<ScaffoldSummary, PkgsmithError> {
    check_target(opts)?;

    let mut summary = ScaffoldSummary {
        root: opts.target_dir.clone(),
        dry_run: opts.dry_run,
        ..Default::default()
    };

    println!("Scaffolding package into {}", opts.target_dir.display());

    for dir in layout {
        let dest = opts.target_dir.join(dir);
        if opts.dry_run {
            println!("  would-create: {}/", dir.display());
        } else {
            fs::create_dir_all(&dest).map_err(|e| failed(dest.clone(), &summary.written, e))?;
        }
        summary.directories.push(dest);
    }

    for file in files {
        let dest = opts.target_dir.join(&file.path);
        if opts.dry_run {
            println!("  would-write: {}", file.path.display());
            continue;
        }
        if let Err(e) = write_file(&dest, &file.content) {
            tracing::warn!(path = %dest.display(), written = summary.written.len(), "scaffold write failed");
            return Err(failed(dest, &summary.written, e));
        }
        println!("  wrote: {}", file.path.display());
        summary.written.push(dest);
    }

    tracing::info!(
        root = %summary.root.display(),
        files = summary.written.len(),
        dry_run = opts.dry_run,
        "scaffold complete"
    );
    Ok(summary)
}

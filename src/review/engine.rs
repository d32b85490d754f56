//! Runs every registered role over every changed file.

use crate::core::config::{ReviewConfig, Severity};
use crate::core::error::PkgsmithError;
use crate::review::report::ReviewReport;
use crate::review::roles::{ROLE_FAILURE_RULE, RoleRegistry, ScanFailure, Severities, Violation};
use crate::review::source::{self, SourceFile};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

pub struct Reviewer {
    registry: RoleRegistry,
    severities: Severities,
}

impl Reviewer {
    pub fn new(config: &ReviewConfig) -> Self {
        Self {
            registry: RoleRegistry::standard(config),
            severities: Severities::from_config(config),
        }
    }

    /// Review with a custom set of roles. Severity overrides in `config`
    /// still apply to `role-failure` violations.
    pub fn with_registry(registry: RoleRegistry, config: &ReviewConfig) -> Self {
        Self {
            registry,
            severities: Severities::from_config(config),
        }
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    /// Scan `files` with every role. A role that cannot process a file
    /// contributes a `role-failure` violation for it, on top of anything it
    /// found before stopping, and the rest of the review carries on.
    pub fn review(&self, files: &[SourceFile]) -> ReviewReport {
        let violations: Vec<Violation> = files
            .par_iter()
            .flat_map_iter(|file| {
                self.registry.roles().iter().flat_map(move |role| {
                    match role.scan(file) {
                        Ok(found) => found,
                        Err(ScanFailure { mut found, error }) => {
                            tracing::warn!(
                                role = role.name(),
                                path = %file.path.display(),
                                error = %error,
                                "role could not scan file"
                            );
                            found.push(Violation {
                                role: role.name(),
                                rule: ROLE_FAILURE_RULE,
                                path: file.path.clone(),
                                line: error.line(),
                                message: format!("could not scan file: {}", error),
                                severity: self.severities.of(ROLE_FAILURE_RULE, Severity::Error),
                            });
                            found
                        }
                    }
                })
            })
            .collect();

        tracing::debug!(files = files.len(), violations = violations.len(), "review finished");
        ReviewReport::new(files.len(), violations, &self.registry.names())
    }
}

/// Read the reviewable files among `paths` (relative to `root` unless
/// absolute). Paths with other extensions and paths that no longer exist are
/// skipped. Reported paths keep the form they were given in.
pub fn load_sources(
    root: &Path,
    paths: &[PathBuf],
    extensions: &[String],
) -> Result<Vec<SourceFile>, PkgsmithError> {
    let mut files = Vec::new();
    for path in paths {
        let wanted = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| extensions.iter().any(|x| x == ext));
        if !wanted {
            tracing::debug!(path = %path.display(), "skipping: extension not reviewed");
            continue;
        }
        let full = if path.is_absolute() {
            path.clone()
        } else {
            root.join(path)
        };
        if !full.is_file() {
            tracing::debug!(path = %full.display(), "skipping: not a file");
            continue;
        }
        let bytes = fs::read(&full)?;
        let content = String::from_utf8_lossy(&bytes).into_owned();
        files.push(SourceFile::new(path.clone(), content).with_api_spec(source::detect_api_spec(&full)));
    }
    Ok(files)
}

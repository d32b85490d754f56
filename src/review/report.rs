//! Aggregated review results and their text/JSON renderings.

use crate::core::config::Severity;
use crate::core::error::PkgsmithError;
use crate::review::roles::Violation;
use colored::Colorize;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewReport {
    pub passed: bool,
    pub files_scanned: usize,
    pub errors: usize,
    pub warnings: usize,
    /// SHA-256 over the ordered violations; stable across runs and thread counts.
    pub fingerprint: String,
    pub violations: Vec<Violation>,
}

impl ReviewReport {
    /// Build a report, ordering violations by path, then by the position of
    /// their role in `role_order`, then line, rule, and message.
    pub fn new(files_scanned: usize, mut violations: Vec<Violation>, role_order: &[&str]) -> Self {
        let rank = |role: &str| {
            role_order
                .iter()
                .position(|r| *r == role)
                .unwrap_or(role_order.len())
        };
        violations.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then_with(|| rank(a.role).cmp(&rank(b.role)))
                .then_with(|| a.line.cmp(&b.line))
                .then_with(|| a.rule.cmp(b.rule))
                .then_with(|| a.message.cmp(&b.message))
        });

        let errors = violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
            .count();
        let warnings = violations.len() - errors;
        let fingerprint = fingerprint(&violations);

        Self {
            passed: errors == 0,
            files_scanned,
            errors,
            warnings,
            fingerprint,
            violations,
        }
    }

    pub fn summary_line(&self) -> String {
        format!(
            "review: summary files={} errors={} warnings={}",
            self.files_scanned, self.errors, self.warnings
        )
    }

    /// Human-readable report. Violations are grouped under a header per file
    /// and a sub-header per role; each line is `path:line:` so editors can
    /// jump to it.
    pub fn render_text(&self, color: bool) -> String {
        let mut out = String::new();
        let mut current: Option<(&std::path::Path, &str)> = None;

        for v in &self.violations {
            if current.map(|(p, _)| p) != Some(v.path.as_path()) {
                if current.is_some() {
                    out.push('\n');
                }
                let header = v.path.display().to_string();
                let _ = writeln!(out, "{}", if color { header.bold().to_string() } else { header });
                current = Some((v.path.as_path(), ""));
            }
            if current.map(|(_, r)| r) != Some(v.role) {
                let _ = writeln!(out, "  [{}]", v.role);
                current = Some((v.path.as_path(), v.role));
            }
            let severity = match (color, v.severity) {
                (false, s) => s.to_string(),
                (true, Severity::Error) => "error".red().bold().to_string(),
                (true, Severity::Warning) => "warning".yellow().to_string(),
            };
            let _ = writeln!(
                out,
                "  {}:{}: {} [{}/{}] {}",
                v.path.display(),
                v.line,
                severity,
                v.role,
                v.rule,
                v.message
            );
        }

        if !self.violations.is_empty() {
            out.push('\n');
        }
        out.push_str(&self.summary_line());
        out.push('\n');

        if self.errors > 0 {
            let _ = writeln!(
                out,
                "review: errors {}: {}",
                self.errors,
                error_preview(&self.violations, ERROR_PREVIEW_LIMIT)
            );
        }
        out
    }

    pub fn render_json(&self) -> Result<String, PkgsmithError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// `Err(ReviewFailed)` when any error-severity violation was found.
    pub fn ensure_passed(&self) -> Result<(), PkgsmithError> {
        if self.passed {
            Ok(())
        } else {
            Err(PkgsmithError::ReviewFailed {
                errors: self.errors,
                warnings: self.warnings,
            })
        }
    }
}

/// How many failing locations the closing summary names.
const ERROR_PREVIEW_LIMIT: usize = 3;

/// `path:line rule` for the first `limit` errors, plus a count of the rest.
fn error_preview(violations: &[Violation], limit: usize) -> String {
    let errors: Vec<&Violation> = violations
        .iter()
        .filter(|v| v.severity == Severity::Error)
        .collect();
    let mut preview = errors
        .iter()
        .take(limit)
        .map(|v| format!("{}:{} {}", v.path.display(), v.line, v.rule))
        .collect::<Vec<_>>()
        .join(", ");
    if errors.len() > limit {
        let _ = write!(preview, " and {} more", errors.len() - limit);
    }
    preview
}

fn fingerprint(violations: &[Violation]) -> String {
    let mut hasher = Sha256::new();
    for v in violations {
        hasher.update(v.path.to_string_lossy().as_bytes());
        hasher.update([0]);
        hasher.update(v.line.to_string().as_bytes());
        hasher.update([0]);
        hasher.update(v.role.as_bytes());
        hasher.update([0]);
        hasher.update(v.rule.as_bytes());
        hasher.update([0]);
        hasher.update(v.severity.to_string().as_bytes());
        hasher.update([0]);
        hasher.update(v.message.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

//! Review roles.
//!
//! Each role owns one category of rule and never looks at another role's
//! output, so roles can be added or reordered without changing what the
//! others report. The registry is assembled once at startup.

pub mod architecture;
pub mod debug;
pub mod docs;
pub mod security;
pub mod structure;
pub mod tester;

use crate::core::config::{ReviewConfig, Severity};
use crate::review::source::{SourceError, SourceFile};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Rule id used for a role that could not finish scanning a file.
pub const ROLE_FAILURE_RULE: &str = "role-failure";

/// A single broken rule at a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub role: &'static str,
    pub rule: &'static str,
    pub path: PathBuf,
    pub line: usize,
    pub message: String,
    pub severity: Severity,
}

/// A checker for one category of problem.
pub trait ReviewRole: Send + Sync {
    fn name(&self) -> &'static str;

    /// One-line summary shown by `pkgsmith review --list-roles`.
    fn description(&self) -> &'static str;

    /// Scan one file. Returning no violations means nothing was found.
    fn scan(&self, file: &SourceFile) -> Result<Vec<Violation>, ScanFailure>;
}

/// A role stopped part-way through a file.
#[derive(Debug)]
pub struct ScanFailure {
    /// Violations found before the error; they are still reported.
    pub found: Vec<Violation>,
    pub error: SourceError,
}

impl From<SourceError> for ScanFailure {
    fn from(error: SourceError) -> Self {
        Self {
            found: Vec::new(),
            error,
        }
    }
}

/// Severity lookup with per-rule overrides from configuration.
#[derive(Debug, Clone, Default)]
pub struct Severities(BTreeMap<String, Severity>);

impl Severities {
    pub fn from_config(config: &ReviewConfig) -> Self {
        Self(config.severity.clone())
    }

    pub fn of(&self, rule: &str, default: Severity) -> Severity {
        self.0.get(rule).copied().unwrap_or(default)
    }
}

/// Helper for roles to build violations against one file.
pub(crate) struct Findings<'a> {
    role: &'static str,
    file: &'a SourceFile,
    severities: &'a Severities,
    found: Vec<Violation>,
}

impl<'a> Findings<'a> {
    pub(crate) fn new(role: &'static str, file: &'a SourceFile, severities: &'a Severities) -> Self {
        Self {
            role,
            file,
            severities,
            found: Vec::new(),
        }
    }

    pub(crate) fn add(
        &mut self,
        rule: &'static str,
        default: Severity,
        line: usize,
        message: impl Into<String>,
    ) {
        self.found.push(Violation {
            role: self.role,
            rule,
            path: self.file.path.clone(),
            line,
            message: message.into(),
            severity: self.severities.of(rule, default),
        });
    }

    pub(crate) fn finish(self) -> Vec<Violation> {
        self.found
    }

    /// Give up on the file, keeping what was found so far.
    pub(crate) fn interrupted(self, error: SourceError) -> ScanFailure {
        ScanFailure {
            found: self.found,
            error,
        }
    }
}

/// Ordered, immutable set of roles.
pub struct RoleRegistry {
    roles: Vec<Box<dyn ReviewRole>>,
}

impl RoleRegistry {
    /// The standard roles in their canonical reporting order.
    pub fn standard(config: &ReviewConfig) -> Self {
        let severities = Severities::from_config(config);
        let limits = config.limits;
        Self::with_roles(vec![
            Box::new(structure::StructureRole::new(limits, severities.clone())),
            Box::new(debug::DebugOutputRole::new(severities.clone())),
            Box::new(tester::TestHygieneRole::new(severities.clone())),
            Box::new(docs::DocsRole::new(severities.clone())),
            Box::new(security::SecurityRole::new(severities.clone())),
            Box::new(architecture::ArchitectureRole::new(limits, severities)),
        ])
    }

    pub fn with_roles(roles: Vec<Box<dyn ReviewRole>>) -> Self {
        Self { roles }
    }

    pub fn roles(&self) -> &[Box<dyn ReviewRole>] {
        &self.roles
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.roles.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub(crate) fn rules(violations: &[Violation]) -> Vec<(&'static str, usize)> {
        violations.iter().map(|v| (v.rule, v.line)).collect()
    }

    pub(crate) fn scan(role: &dyn ReviewRole, path: &str, src: &str) -> Vec<Violation> {
        role.scan(&SourceFile::new(path, src)).expect("scan")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_order() {
        let registry = RoleRegistry::standard(&ReviewConfig::default());
        assert_eq!(
            registry.names(),
            vec!["structure", "debug", "tester", "docs", "security", "architecture"]
        );
    }

    #[test]
    fn severity_overrides_apply() {
        let mut config = ReviewConfig::default();
        config
            .severity
            .insert("file-length".to_string(), Severity::Warning);
        let severities = Severities::from_config(&config);
        assert_eq!(severities.of("file-length", Severity::Error), Severity::Warning);
        assert_eq!(severities.of("bare-except", Severity::Error), Severity::Error);
    }
}

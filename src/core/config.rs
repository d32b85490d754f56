//! Repository conventions shared by the generator and the reviewer.
//!
//! Everything that used to be a hardcoded constant (layout contract, review
//! thresholds, version tags, severities) lives in [`Conventions`]. The struct
//! is built once per invocation, from `pkgsmith.toml` when present, and then
//! passed by reference; nothing mutates it afterwards.

use crate::core::error::PkgsmithError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "pkgsmith.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Conventions {
    pub generator: GeneratorConfig,
    pub layout: LayoutContract,
    pub review: ReviewConfig,
}

/// Generator settings and the version tags exposed to templates.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Directory (relative to the working directory) that receives new packages.
    pub packages_dir: String,
    /// On-disk template set; the embedded copy is used when it is missing.
    pub templates_dir: String,
    pub github_user: String,
    pub python_version: String,
    pub python_version_short: String,
    pub ruff_version: String,
    /// Canonical test coverage threshold, in percent.
    pub coverage_threshold: u8,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            packages_dir: "packages".to_string(),
            templates_dir: "templates/python-package".to_string(),
            github_user: "pkgsmith".to_string(),
            python_version: "3.14".to_string(),
            python_version_short: "py314".to_string(),
            ruff_version: "v0.14.0".to_string(),
            coverage_threshold: 80,
        }
    }
}

/// Directories every generated package must contain. CI relies on these
/// paths existing, so they are created even when no template writes into
/// them. Entries may use placeholders.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutContract {
    pub directories: Vec<String>,
}

impl Default for LayoutContract {
    fn default() -> Self {
        Self {
            directories: [
                "src/{{ module_name }}/api",
                "src/{{ module_name }}/models",
                "src/{{ module_name }}/services",
                "src/{{ module_name }}/repositories",
                "src/{{ module_name }}/exceptions",
                "tests/unit",
                "tests/integration",
                ".github/workflows",
            ]
            .iter()
            .map(|d| d.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// File extensions the reviewer scans; everything else in the change is ignored.
    pub extensions: Vec<String>,
    pub limits: ReviewLimits,
    /// Per-rule severity overrides keyed by rule id (e.g. `file-length = "warning"`).
    pub severity: BTreeMap<String, Severity>,
    pub protected_branches: Vec<String>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["py".to_string()],
            limits: ReviewLimits::default(),
            severity: BTreeMap::new(),
            protected_branches: vec!["main".to_string(), "master".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReviewLimits {
    pub max_file_lines: usize,
    pub max_function_lines: usize,
    pub max_function_params: usize,
    pub max_class_methods: usize,
    pub max_imports: usize,
    pub max_classes_per_file: usize,
}

impl Default for ReviewLimits {
    fn default() -> Self {
        Self {
            max_file_lines: 200,
            max_function_lines: 30,
            max_function_params: 5,
            max_class_methods: 10,
            max_imports: 15,
            max_classes_per_file: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl Conventions {
    /// Load conventions from an explicit path. The file must exist.
    pub fn from_path(path: &Path) -> Result<Self, PkgsmithError> {
        let content = fs::read_to_string(path).map_err(|e| {
            PkgsmithError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| PkgsmithError::ConfigError(format!("{}: {}", path.display(), e)))
    }

    /// Load `pkgsmith.toml` from `dir` if present, otherwise the defaults.
    pub fn discover(dir: &Path) -> Result<Self, PkgsmithError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading conventions");
            Self::from_path(&path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: Conventions = toml::from_str(
            r#"
[review.limits]
max_file_lines = 400

[review.severity]
file-length = "warning"
"#,
        )
        .unwrap();
        assert_eq!(cfg.review.limits.max_file_lines, 400);
        assert_eq!(cfg.review.limits.max_function_lines, 30);
        assert_eq!(
            cfg.review.severity.get("file-length"),
            Some(&Severity::Warning)
        );
        assert_eq!(cfg.generator.coverage_threshold, 80);
        assert_eq!(cfg.layout, LayoutContract::default());
    }

    #[test]
    fn unknown_severity_is_rejected() {
        let err = toml::from_str::<Conventions>("[review.severity]\nfile-length = \"fatal\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn discover_falls_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Conventions::discover(tmp.path()).unwrap();
        assert_eq!(cfg, Conventions::default());
    }
}

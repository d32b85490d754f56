//! Parameter resolution: one raw package name in, every naming variant out.
//!
//! Resolution is a pure string transformation, so the same raw name and
//! description always produce the same [`RenderContext`].

use crate::core::config::GeneratorConfig;
use crate::core::error::PkgsmithError;
use std::collections::BTreeMap;

/// Words that cannot be used as a module identifier in the generated package.
const RESERVED_WORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "false", "finally", "for", "from", "global", "if", "import", "in", "is",
    "lambda", "none", "nonlocal", "not", "or", "pass", "raise", "return", "true", "try", "while",
    "with", "yield",
];

/// Validated package name and its derived forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageName {
    /// Hyphenated display form, e.g. `billing-core`.
    pub display: String,
    /// Identifier form, e.g. `billing_core`.
    pub identifier: String,
    /// Constant form, e.g. `BILLING_CORE`.
    pub upper: String,
    /// Separator-free tag, e.g. `billingcore`.
    pub compact: String,
    /// Title form, e.g. `Billing Core`.
    pub title: String,
}

fn is_separator(c: char) -> bool {
    c == '-' || c == '_' || c.is_whitespace()
}

fn invalid(raw: &str, reason: impl Into<String>) -> PkgsmithError {
    PkgsmithError::InvalidName {
        name: raw.to_string(),
        reason: reason.into(),
    }
}

impl PackageName {
    pub fn parse(raw: &str) -> Result<Self, PkgsmithError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(invalid(raw, "name must not be empty"));
        }
        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || is_separator(*c)))
        {
            return Err(invalid(
                raw,
                format!("'{}' is not a letter, digit, or separator", bad),
            ));
        }

        let segments: Vec<String> = trimmed
            .split(is_separator)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_ascii_lowercase())
            .collect();
        let first = segments
            .first()
            .and_then(|s| s.chars().next())
            .ok_or_else(|| invalid(raw, "name contains only separators"))?;
        if !first.is_ascii_alphabetic() {
            return Err(invalid(raw, "name must start with a letter"));
        }

        let identifier = segments.join("_");
        if RESERVED_WORDS.contains(&identifier.as_str()) {
            return Err(invalid(raw, format!("'{}' is a reserved word", identifier)));
        }

        let title = segments
            .iter()
            .map(|s| {
                let mut chars = s.chars();
                match chars.next() {
                    Some(c) => c.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Self {
            display: segments.join("-"),
            upper: identifier.to_ascii_uppercase(),
            compact: segments.concat(),
            identifier,
            title,
        })
    }
}

/// Placeholder name to resolved value. Built once per generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderContext {
    values: BTreeMap<String, String>,
}

impl RenderContext {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Resolve the render context for a new package.
pub fn resolve(
    raw_name: &str,
    description: &str,
    generator: &GeneratorConfig,
) -> Result<(PackageName, RenderContext), PkgsmithError> {
    let name = PackageName::parse(raw_name)?;
    let description = description.trim();
    if description.is_empty() {
        return Err(PkgsmithError::ValidationError(
            "package description must not be empty".to_string(),
        ));
    }

    let ctx = RenderContext::from_pairs([
        ("package_name", name.display.clone()),
        ("module_name", name.identifier.clone()),
        ("module_upper", name.upper.clone()),
        ("module_compact", name.compact.clone()),
        ("package_title", name.title.clone()),
        ("description", description.to_string()),
        ("python_version", generator.python_version.clone()),
        ("python_version_short", generator.python_version_short.clone()),
        ("ruff_version", generator.ruff_version.clone()),
        ("coverage_threshold", generator.coverage_threshold.to_string()),
        ("github_user", generator.github_user.clone()),
    ]);
    tracing::debug!(package = %name.display, keys = ?ctx.keys().collect::<Vec<_>>(), "resolved render context");
    Ok((name, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_core_variants() {
        let (name, ctx) =
            resolve("billing-core", "Billing module", &GeneratorConfig::default()).unwrap();
        assert_eq!(name.identifier, "billing_core");
        assert_eq!(ctx.get("module_name"), Some("billing_core"));
        assert_eq!(ctx.get("module_upper"), Some("BILLING_CORE"));
        assert_eq!(ctx.get("package_name"), Some("billing-core"));
        assert_eq!(ctx.get("module_compact"), Some("billingcore"));
        assert_eq!(ctx.get("package_title"), Some("Billing Core"));
        assert_eq!(ctx.get("description"), Some("Billing module"));
        assert_eq!(ctx.get("coverage_threshold"), Some("80"));
    }

    #[test]
    fn separators_are_normalised() {
        let name = PackageName::parse("  Billing__Core Api ").unwrap();
        assert_eq!(name.display, "billing-core-api");
        assert_eq!(name.identifier, "billing_core_api");
        assert_eq!(name.upper, "BILLING_CORE_API");
    }

    #[test]
    fn resolution_is_deterministic() {
        let cfg = GeneratorConfig::default();
        let a = resolve("fast-crud", "CRUD", &cfg).unwrap();
        let b = resolve("fast-crud", "CRUD", &cfg).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_invalid_names() {
        for raw in ["", "   ", "--", "9lives", "bad/name", "naïve", "class", "hello!"] {
            let err = PackageName::parse(raw).unwrap_err();
            assert!(
                matches!(err, PkgsmithError::InvalidName { .. }),
                "expected InvalidName for {:?}, got {:?}",
                raw,
                err
            );
        }
    }

    #[test]
    fn rejects_empty_description() {
        let err = resolve("ok-name", "  ", &GeneratorConfig::default()).unwrap_err();
        assert!(matches!(err, PkgsmithError::ValidationError(_)));
    }
}

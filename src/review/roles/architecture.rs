//! Module shape and API contracts.

use super::{Findings, ReviewRole, ScanFailure, Severities, Violation};
use crate::core::config::{ReviewLimits, Severity};
use crate::review::source::{ApiSpec, SourceFile};
use regex::Regex;
use std::sync::OnceLock;

fn route_declaration() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bAPIRouter\s*\(|^\s*@(?:app|router)\.\w+").unwrap())
}

pub struct ArchitectureRole {
    limits: ReviewLimits,
    severities: Severities,
}

impl ArchitectureRole {
    pub fn new(limits: ReviewLimits, severities: Severities) -> Self {
        Self { limits, severities }
    }
}

impl ReviewRole for ArchitectureRole {
    fn name(&self) -> &'static str {
        "architecture"
    }

    fn description(&self) -> &'static str {
        "import and class counts, OpenAPI document for HTTP routes"
    }

    fn scan(&self, file: &SourceFile) -> Result<Vec<Violation>, ScanFailure> {
        let mut out = Findings::new(self.name(), file, &self.severities);
        let lines = file.lines()?;
        let outline = file.outline()?;
        let limits = &self.limits;

        if let Some(&line) = outline.imports.get(limits.max_imports) {
            out.add(
                "too-many-imports",
                Severity::Error,
                line,
                format!(
                    "{} import statements (max {}); split the module",
                    outline.imports.len(),
                    limits.max_imports
                ),
            );
        }

        let top_level: Vec<_> = outline.classes().filter(|c| c.parent.is_none()).collect();
        if let Some(class) = top_level.get(limits.max_classes_per_file) {
            out.add(
                "too-many-classes",
                Severity::Error,
                class.line,
                format!(
                    "{} classes in one module (max {})",
                    top_level.len(),
                    limits.max_classes_per_file
                ),
            );
        }

        if file.api_spec == ApiSpec::Missing && !file.is_test() {
            let first_route = lines
                .iter()
                .find(|l| !l.in_string && route_declaration().is_match(&l.code));
            if let Some(line) = first_route {
                out.add(
                    "missing-api-spec",
                    Severity::Error,
                    line.number,
                    "module declares HTTP routes but the package has no openapi.yaml",
                );
            }
        }

        Ok(out.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::roles::test_support::rules;

    fn role() -> ArchitectureRole {
        ArchitectureRole::new(ReviewLimits::default(), Severities::default())
    }

    #[test]
    fn import_limit_reports_first_excess_import() {
        let src: String = (0..17).map(|i| format!("import mod{}\n", i)).collect();
        let found = role().scan(&SourceFile::new("src/pkg/m.py", src)).unwrap();
        assert_eq!(rules(&found), vec![("too-many-imports", 16)]);
        assert!(found[0].message.starts_with("17 import"));
    }

    #[test]
    fn nested_classes_do_not_count() {
        let src = "\
class A:
    class Meta:
        pass


class B:
    pass
";
        assert!(role().scan(&SourceFile::new("src/pkg/m.py", src)).unwrap().is_empty());

        let third = format!("{}\n\nclass C:\n    pass\n", src);
        let found = role().scan(&SourceFile::new("src/pkg/m.py", third)).unwrap();
        assert_eq!(rules(&found), vec![("too-many-classes", 10)]);
    }

    #[test]
    fn routes_need_an_openapi_document() {
        let src = "\
from fastapi import APIRouter

router = APIRouter()


@router.get(\"/health\")
def health() -> dict:
    return {}
";
        let missing = SourceFile::new("src/pkg/api/routes.py", src).with_api_spec(ApiSpec::Missing);
        assert_eq!(rules(&role().scan(&missing).unwrap()), vec![("missing-api-spec", 3)]);

        let present = SourceFile::new("src/pkg/api/routes.py", src).with_api_spec(ApiSpec::Present);
        assert!(role().scan(&present).unwrap().is_empty());

        let unknown = SourceFile::new("src/pkg/api/routes.py", src);
        assert!(role().scan(&unknown).unwrap().is_empty());
    }
}

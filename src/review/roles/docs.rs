//! Documentation hygiene: type annotations and docstrings on the public API,
//! commented-out code, and TODO format.
//!
//! A function is public when its name does not start with an underscore and
//! it is either module level or a method of a class. Functions nested inside
//! other functions are implementation detail and are skipped.

use super::{Findings, ReviewRole, ScanFailure, Severities, Violation};
use crate::core::config::Severity;
use crate::review::source::{Line, SourceFile};
use regex::Regex;
use std::sync::OnceLock;

fn todo_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bTODO\b").unwrap())
}

fn todo_well_formed() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bTODO\([^()\s]+\): \S").unwrap())
}

fn code_like() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?x)
            ^(?:
                (?:async\s+)?def\s+\w+\s*\(
              | class\s+\w+.*:$
              | import\s+[\w.]+
              | from\s+[\w.]+\s+import\s
              | (?:return|raise|yield)(?:\s|$)
              | (?:if|elif|while|for|with|try|except|else|finally)\b.*:$
              | [\w.\[\]'"]+\s*(?:[-+*/]?=)\s*\S
              | [\w.]+\(.*\)$
            )"#,
        )
        .unwrap()
    })
}

/// Pragmas and markers that look like code but are meant for tools.
fn is_directive(comment: &str) -> bool {
    let c = comment.trim_start();
    c.starts_with('!')
        || c.starts_with("-*-")
        || c.starts_with("type:")
        || c.starts_with("noqa")
        || c.starts_with("pragma")
        || c.starts_with("pylint:")
        || c.starts_with("fmt:")
        || c.starts_with("isort:")
}

fn is_commented_code(comment: &str) -> bool {
    let text = comment.trim();
    if text.is_empty() || is_directive(comment) || todo_marker().is_match(text) {
        return false;
    }
    // Prose.
    if text.ends_with('.') && !text.ends_with("...") {
        return false;
    }
    code_like().is_match(text)
}

pub struct DocsRole {
    severities: Severities,
}

impl DocsRole {
    pub fn new(severities: Severities) -> Self {
        Self { severities }
    }

    fn check_comments(&self, lines: &[Line<'_>], out: &mut Findings<'_>) {
        for line in lines {
            let Some(comment) = line.comment else { continue };
            if todo_marker().is_match(comment) && !todo_well_formed().is_match(comment) {
                out.add(
                    "todo-format",
                    Severity::Error,
                    line.number,
                    "TODO must be written as 'TODO(owner): description'",
                );
            }
            if line.code.trim().is_empty() && is_commented_code(comment) {
                out.add(
                    "commented-out-code",
                    Severity::Warning,
                    line.number,
                    "commented-out code; delete it or restore it",
                );
            }
        }
    }
}

impl ReviewRole for DocsRole {
    fn name(&self) -> &'static str {
        "docs"
    }

    fn description(&self) -> &'static str {
        "annotations and docstrings on public API, TODO format, dead comments"
    }

    fn scan(&self, file: &SourceFile) -> Result<Vec<Violation>, ScanFailure> {
        let mut out = Findings::new(self.name(), file, &self.severities);
        let lines = file.lines()?;
        let outline = file.outline()?;

        for function in outline.api_functions().filter(|f| f.is_public()) {
            if !function.returns_annotated {
                out.add(
                    "missing-return-type",
                    Severity::Error,
                    function.line,
                    format!("public function '{}' has no return type annotation", function.name),
                );
            }
            let bare: Vec<&str> = function
                .params
                .iter()
                .filter(|p| !p.annotated && !matches!(p.name.as_str(), "self" | "cls"))
                .map(|p| p.name.as_str())
                .collect();
            if !bare.is_empty() {
                out.add(
                    "missing-annotation",
                    Severity::Error,
                    function.line,
                    format!(
                        "public function '{}' has unannotated parameters: {}",
                        function.name,
                        bare.join(", ")
                    ),
                );
            }
            if !function.has_docstring {
                out.add(
                    "missing-docstring",
                    Severity::Warning,
                    function.line,
                    format!("public function '{}' has no docstring", function.name),
                );
            }
        }

        for class in outline.classes().filter(|c| c.is_public() && !c.has_docstring) {
            out.add(
                "missing-docstring",
                Severity::Warning,
                class.line,
                format!("public class '{}' has no docstring", class.name),
            );
        }

        self.check_comments(&lines, &mut out);
        Ok(out.finish())
    }
}

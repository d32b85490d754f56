//! Test scaffolding that leaked into production modules.

use super::{Findings, ReviewRole, ScanFailure, Severities, Violation};
use crate::core::config::Severity;
use crate::review::source::SourceFile;
use regex::Regex;
use std::sync::OnceLock;

fn assert_stmt() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*assert\b").unwrap())
}

fn debugger_hook() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:^|[^\w.])breakpoint\s*\(|^\s*import\s+(?:i?pdb)\b|^\s*from\s+i?pdb\s+import\b|\bi?pdb\.set_trace\s*\(",
        )
        .unwrap()
    })
}

pub struct TestHygieneRole {
    severities: Severities,
}

impl TestHygieneRole {
    pub fn new(severities: Severities) -> Self {
        Self { severities }
    }
}

impl ReviewRole for TestHygieneRole {
    fn name(&self) -> &'static str {
        "tester"
    }

    fn description(&self) -> &'static str {
        "asserts and debugger hooks outside tests"
    }

    fn scan(&self, file: &SourceFile) -> Result<Vec<Violation>, ScanFailure> {
        let mut out = Findings::new(self.name(), file, &self.severities);
        if file.is_test() {
            return Ok(out.finish());
        }
        for line in file.lines()? {
            if line.in_string {
                continue;
            }
            if assert_stmt().is_match(&line.code) {
                out.add(
                    "assert-in-source",
                    Severity::Error,
                    line.number,
                    "assert statement in library code; raise an exception instead",
                );
            }
            if debugger_hook().is_match(&line.code) {
                out.add(
                    "debugger-hook",
                    Severity::Error,
                    line.number,
                    "debugger hook left in source",
                );
            }
        }
        Ok(out.finish())
    }
}

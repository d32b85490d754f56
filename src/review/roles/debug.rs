//! Console output left in library code.

use super::{Findings, ReviewRole, ScanFailure, Severities, Violation};
use crate::core::config::Severity;
use crate::review::source::SourceFile;
use regex::Regex;
use std::sync::OnceLock;

fn console_call() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:^|[^\w.])(print|pprint|pprint\.pprint|sys\.stdout\.write|sys\.stderr\.write)\s*\(",
        )
        .unwrap()
    })
}

pub struct DebugOutputRole {
    severities: Severities,
}

impl DebugOutputRole {
    pub fn new(severities: Severities) -> Self {
        Self { severities }
    }
}

impl ReviewRole for DebugOutputRole {
    fn name(&self) -> &'static str {
        "debug"
    }

    fn description(&self) -> &'static str {
        "print and raw stdout/stderr writes outside tests"
    }

    fn scan(&self, file: &SourceFile) -> Result<Vec<Violation>, ScanFailure> {
        let mut out = Findings::new(self.name(), file, &self.severities);
        if file.is_test() {
            return Ok(out.finish());
        }
        for line in file.lines()? {
            if let Some(caps) = console_call().captures(&line.code) {
                out.add(
                    "console-output",
                    Severity::Error,
                    line.number,
                    format!("{}() call; use logging instead", &caps[1]),
                );
            }
        }
        Ok(out.finish())
    }
}

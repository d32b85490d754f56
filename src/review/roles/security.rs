//! Secrets, exception swallowing, and dynamic code execution.

use super::{Findings, ReviewRole, ScanFailure, Severities, Violation};
use crate::core::config::Severity;
use crate::review::source::{Line, SourceFile};
use regex::Regex;
use std::sync::OnceLock;

/// Literal values that look like credentials regardless of where they appear.
fn token_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            (
                Regex::new(r"(A3T[A-Z0-9]|AKIA|AGPA|AIDA|AROA|AIPA|ANPA|ANVA|ASIA)[0-9A-Z]{16}").unwrap(),
                "AWS access key",
            ),
            (
                Regex::new(r"(ghp|gho|ghu|ghs|ghr)_[a-zA-Z0-9_]{36,255}").unwrap(),
                "GitHub token",
            ),
            (Regex::new(r"\bsk-[A-Za-z0-9_\-]{20,}").unwrap(), "API secret key"),
            (Regex::new(r"\bxox[abprs]-[A-Za-z0-9\-]{10,}").unwrap(), "Slack token"),
            (
                Regex::new(r"(?i)\bbearer\s+[a-zA-Z0-9_\-\.=]{16,}").unwrap(),
                "bearer token",
            ),
            (
                Regex::new(r"-----BEGIN (RSA |DSA |EC |OPENSSH )?PRIVATE KEY-----").unwrap(),
                "private key",
            ),
            (
                Regex::new(r"(?i)(postgres(ql)?|mysql|mongodb(\+srv)?|redis|amqp)://[^\s:/@]+:[^\s@]+@")
                    .unwrap(),
                "connection string with credentials",
            ),
        ]
    })
}

const SECRET_NAME: &str =
    r"\w*(?:password|passwd|pwd|secret|token|api_?key|access_?key|private_?key|credential)s?\w*";

/// `name = "..."` or `name="..."` where the name suggests a credential.
fn secret_assignment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r#"(?i)(?:^|[\s,(.])({})\s*(?::\s*[\w\[\]., |]+)?=\s*[rbuf]{{0,2}}["']"#,
            SECRET_NAME
        ))
        .unwrap()
    })
}

fn secret_key() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("(?i)^{}$", SECRET_NAME)).unwrap())
}

/// `mapping["key"] = "..."`; both literals are blanked in the code.
fn subscript_assignment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\[\s*[rbuf]{0,2}(["'])["']\s*\]\s*=\s*[rbuf]{0,2}["']"#).unwrap())
}

fn bare_except() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*except\s*:").unwrap())
}

fn broad_except() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*except\b[^:]*\b(Exception|BaseException)\b").unwrap())
}

fn dynamic_execution() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|[^\w.])(eval|exec|__import__)\s*\(").unwrap())
}

/// Number of string literals that open before the end of `prefix`, counting
/// from the blanked code (`""`, `''`, or a triple-quoted pair).
fn literals_before(prefix: &str, starts_in_string: bool) -> usize {
    let bytes = prefix.as_bytes();
    let mut count = 0;
    let mut i = 0;
    // Closing quotes of a string opened on an earlier line.
    if starts_in_string && (prefix.starts_with("\"\"\"") || prefix.starts_with("'''")) {
        i = 3;
    }
    while i < bytes.len() {
        let c = bytes[i];
        if c == b'"' || c == b'\'' {
            let triple = bytes.get(i + 1) == Some(&c) && bytes.get(i + 2) == Some(&c);
            let width = if triple && bytes.get(i + 3) == Some(&c) { 6 } else if triple { 3 } else { 2 };
            count += 1;
            i += width;
        } else {
            i += 1;
        }
    }
    count
}

/// The credential-like name on `line` that is assigned a non-empty literal.
fn assigned_secret_name(line: &Line<'_>) -> Option<String> {
    let literal_at = |quote: usize| {
        line.strings
            .get(literals_before(&line.code[..quote], line.in_string))
            .map(String::as_str)
            .unwrap_or_default()
    };
    if let Some(caps) = secret_assignment().captures(&line.code) {
        // The match ends on the opening quote of the assigned literal.
        let quote = caps.get(0).map_or(0, |m| m.end().saturating_sub(1));
        if !literal_at(quote).is_empty() {
            return Some(caps[1].to_string());
        }
    }
    for caps in subscript_assignment().captures_iter(&line.code) {
        let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let name = literal_at(key.start());
        if secret_key().is_match(name) && !literal_at(whole.end().saturating_sub(1)).is_empty() {
            return Some(name.to_string());
        }
    }
    None
}

/// Describe the hardcoded secret on `line`, if any.
fn find_secret(line: &Line<'_>) -> Option<String> {
    let from_env = line.raw.contains("getenv") || line.raw.contains("environ");
    if !from_env {
        if let Some(name) = assigned_secret_name(line) {
            return Some(format!(
                "'{}' is assigned a literal value; load it from the environment",
                name
            ));
        }
    }
    line.strings.iter().find_map(|literal| {
        token_patterns()
            .iter()
            .find(|(re, _)| re.is_match(literal))
            .map(|(_, label)| format!("{} found in a string literal", label))
    })
}

pub struct SecurityRole {
    severities: Severities,
}

impl SecurityRole {
    pub fn new(severities: Severities) -> Self {
        Self { severities }
    }
}

impl ReviewRole for SecurityRole {
    fn name(&self) -> &'static str {
        "security"
    }

    fn description(&self) -> &'static str {
        "hardcoded secrets, swallowed exceptions, eval/exec"
    }

    fn scan(&self, file: &SourceFile) -> Result<Vec<Violation>, ScanFailure> {
        let mut out = Findings::new(self.name(), file, &self.severities);
        for line in file.lines()? {
            if let Some(message) = find_secret(&line) {
                out.add("hardcoded-secret", Severity::Error, line.number, message);
            }
            if line.in_string {
                continue;
            }
            if bare_except().is_match(&line.code) {
                out.add(
                    "bare-except",
                    Severity::Error,
                    line.number,
                    "bare 'except:' catches everything, including KeyboardInterrupt",
                );
            } else if let Some(caps) = broad_except().captures(&line.code) {
                out.add(
                    "broad-except",
                    Severity::Warning,
                    line.number,
                    format!("catching '{}' hides unrelated failures", &caps[1]),
                );
            }
            if let Some(caps) = dynamic_execution().captures(&line.code) {
                out.add(
                    "dynamic-execution",
                    Severity::Error,
                    line.number,
                    format!("{}() executes dynamic code", &caps[1]),
                );
            }
        }
        Ok(out.finish())
    }
}

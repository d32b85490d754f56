//! Size limits: files, functions, parameter lists, and classes.

use super::{Findings, ReviewRole, ScanFailure, Severities, Violation};
use crate::core::config::{ReviewLimits, Severity};
use crate::review::source::{BlockKind, SourceFile};

pub struct StructureRole {
    limits: ReviewLimits,
    severities: Severities,
}

impl StructureRole {
    pub fn new(limits: ReviewLimits, severities: Severities) -> Self {
        Self { limits, severities }
    }
}

fn counts_as_param(name: &str) -> bool {
    !matches!(name, "self" | "cls")
}

impl ReviewRole for StructureRole {
    fn name(&self) -> &'static str {
        "structure"
    }

    fn description(&self) -> &'static str {
        "file, function, parameter and method count limits"
    }

    fn scan(&self, file: &SourceFile) -> Result<Vec<Violation>, ScanFailure> {
        let mut out = Findings::new(self.name(), file, &self.severities);
        let limits = &self.limits;

        let total = file.line_count();
        if total > limits.max_file_lines {
            out.add(
                "file-length",
                Severity::Error,
                1,
                format!("file has {} lines (max {})", total, limits.max_file_lines),
            );
        }

        let outline = match file.outline() {
            Ok(outline) => outline,
            Err(error) => return Err(out.interrupted(error)),
        };
        for function in outline.functions() {
            let span = function.line_span();
            if span > limits.max_function_lines {
                out.add(
                    "function-length",
                    Severity::Error,
                    function.line,
                    format!(
                        "function '{}' has {} lines (max {})",
                        function.name, span, limits.max_function_lines
                    ),
                );
            }
            let params = function
                .params
                .iter()
                .filter(|p| counts_as_param(&p.name))
                .count();
            if params > limits.max_function_params {
                out.add(
                    "too-many-parameters",
                    Severity::Error,
                    function.line,
                    format!(
                        "function '{}' takes {} parameters (max {})",
                        function.name, params, limits.max_function_params
                    ),
                );
            }
        }

        for (index, class) in outline.blocks.iter().enumerate() {
            if class.kind != BlockKind::Class {
                continue;
            }
            let methods = outline.methods_of(index).count();
            if methods > limits.max_class_methods {
                out.add(
                    "too-many-methods",
                    Severity::Error,
                    class.line,
                    format!(
                        "class '{}' defines {} methods (max {})",
                        class.name, methods, limits.max_class_methods
                    ),
                );
            }
        }

        Ok(out.finish())
    }
}

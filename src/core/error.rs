use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PkgsmithError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Invalid package name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
    #[error("Template '{template}' references unresolved placeholder '{placeholder}'")]
    UnresolvedPlaceholder {
        template: String,
        placeholder: String,
    },
    #[error("Template '{template}' is malformed: {message}")]
    TemplateSyntax { template: String, message: String },
    #[error("Template not found: {0}")]
    TemplateNotFound(String),
    #[error("Target directory already exists and is not empty: {} (pass --force to write into it)", .0.display())]
    TargetExists(PathBuf),
    #[error("Failed to write {}: {source} (already written: {})", path.display(), written_list(written))]
    WriteFailed {
        path: PathBuf,
        written: Vec<PathBuf>,
        #[source]
        source: io::Error,
    },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Version control error: {0}")]
    VcsError(String),
    #[error("Review failed: {errors} error(s), {warnings} warning(s)")]
    ReviewFailed { errors: usize, warnings: usize },
    #[error("Validation error: {0}")]
    ValidationError(String),
}

fn written_list(written: &[PathBuf]) -> String {
    if written.is_empty() {
        return "none".to_string();
    }
    written
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

//! Template sets: an ordered list of (output path, template body) pairs.
//!
//! A set lives in its own directory next to a `manifest.toml`:
//!
//! ```toml
//! [[file]]
//! path = "src/{{ module_name }}/__init__.py"
//! template = "src/__init__.py.tmpl"
//!
//! [[file]]
//! path = "tests/__init__.py"   # no template: written empty
//! ```
//!
//! Manifest order is the write order. Template bodies are opaque text to the
//! loader; only the renderer interprets them.

use crate::core::assets;
use crate::core::error::PkgsmithError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.toml";
pub const DEFAULT_SET: &str = "python-package";

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "file")]
    files: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    path: String,
    #[serde(default)]
    template: Option<String>,
}

/// Where template bodies are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// A set compiled into the binary, by name.
    Embedded(String),
    /// A set directory on disk.
    Directory(PathBuf),
}

impl TemplateSource {
    /// Prefer the on-disk set at `dir` when it has a manifest, else the embedded default.
    pub fn locate(dir: &Path) -> Self {
        if dir.join(MANIFEST_FILE).is_file() {
            TemplateSource::Directory(dir.to_path_buf())
        } else {
            TemplateSource::Embedded(DEFAULT_SET.to_string())
        }
    }

    fn read(&self, rel: &str) -> Result<String, PkgsmithError> {
        match self {
            TemplateSource::Embedded(set) => {
                let key = format!("{}/{}", set, rel);
                assets::get_template(&key).ok_or(PkgsmithError::TemplateNotFound(key))
            }
            TemplateSource::Directory(dir) => {
                let path = dir.join(rel);
                if !path.is_file() {
                    return Err(PkgsmithError::TemplateNotFound(path.display().to_string()));
                }
                fs::read_to_string(&path).map_err(PkgsmithError::IoError)
            }
        }
    }

    fn label(&self) -> String {
        match self {
            TemplateSource::Embedded(set) => format!("embedded:{}", set),
            TemplateSource::Directory(dir) => dir.display().to_string(),
        }
    }
}

/// One file of a template set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEntry {
    /// Output path relative to the package root; may contain placeholders.
    pub output_path: String,
    /// Template file the body came from, used in error messages.
    pub source: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    name: String,
    description: Option<String>,
    entries: Vec<TemplateEntry>,
}

impl TemplateSet {
    pub fn load(source: &TemplateSource) -> Result<Self, PkgsmithError> {
        if let TemplateSource::Embedded(set) = source {
            let known = assets::list_template_sets();
            if !known.contains(set) {
                return Err(PkgsmithError::TemplateNotFound(format!(
                    "embedded set '{}' (available: {})",
                    set,
                    known.join(", ")
                )));
            }
        }
        let manifest_text = source.read(MANIFEST_FILE)?;
        let manifest: Manifest = toml::from_str(&manifest_text).map_err(|e| {
            PkgsmithError::ConfigError(format!("{} {}: {}", source.label(), MANIFEST_FILE, e))
        })?;
        if manifest.files.is_empty() {
            return Err(PkgsmithError::ConfigError(format!(
                "{} {} lists no files",
                source.label(),
                MANIFEST_FILE
            )));
        }

        let mut entries = Vec::with_capacity(manifest.files.len());
        for file in manifest.files {
            let (body, origin) = match &file.template {
                Some(t) => (source.read(t)?, t.clone()),
                None => (String::new(), file.path.clone()),
            };
            entries.push(TemplateEntry {
                output_path: file.path,
                source: origin,
                body,
            });
        }

        tracing::debug!(source = %source.label(), files = entries.len(), "loaded template set");
        Ok(Self {
            name: source.label(),
            description: manifest.description,
            entries,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn entries(&self) -> &[TemplateEntry] {
        &self.entries
    }
}

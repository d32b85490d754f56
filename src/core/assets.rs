//! Embedded template assets.
//!
//! The `templates/` tree is baked into the binary so `pkgsmith new` works
//! from any directory. A checked-out copy on disk takes precedence (see
//! [`crate::generate::template_set::TemplateSource`]).

use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "templates/"]
#[exclude = "*.swp"]
struct TemplateAssets;

/// Fetch an embedded template file by its path below `templates/`.
pub fn get_template(path: &str) -> Option<String> {
    let file = TemplateAssets::get(path)?;
    Some(String::from_utf8_lossy(&file.data).into_owned())
}

/// Every embedded template path, sorted.
fn list_templates() -> Vec<String> {
    let mut names: Vec<String> = TemplateAssets::iter().map(|n| n.into_owned()).collect();
    names.sort();
    names
}

/// Names of the embedded template sets (directories holding a `manifest.toml`).
pub fn list_template_sets() -> Vec<String> {
    list_templates()
        .into_iter()
        .filter_map(|p| p.strip_suffix("/manifest.toml").map(str::to_string))
        .collect()
}

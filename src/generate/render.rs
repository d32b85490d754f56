//! Template rendering.
//!
//! Syntax understood by the renderer:
//!
//! - `{{ key }}` substitutes a value from the [`RenderContext`]
//! - `{% if key %} ... {% else %} ... {% endif %}` keeps a branch depending on
//!   whether the value is non-empty (blocks nest)
//! - `{% raw %} ... {% endraw %}` is emitted verbatim, so templates can carry
//!   `${{ ... }}` expressions meant for CI runners
//!
//! Jinja's `-` whitespace control is rejected rather than ignored.
//!
//! Raw regions are split out first; placeholders and tags are only tokenized
//! in the text between them. Every key a template mentions must resolve, even
//! inside a branch that is not taken, so a missing variable is caught on the
//! first run instead of when a flag flips.

use crate::core::error::PkgsmithError;
use crate::generate::params::RenderContext;
use crate::generate::template_set::TemplateSet;
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

/// A rendered file, ready for the scaffold writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Raw(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Text(String),
    Var(String),
    If(String),
    Else,
    EndIf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    Var(String),
    If {
        key: String,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

enum BlockEnd {
    Else,
    EndIf,
}

fn raw_open() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{%\s*raw\s*%\}").expect("valid raw regex"))
}

fn raw_close() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{%\s*endraw\s*%\}").expect("valid endraw regex"))
}

fn is_key(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Pass 1: carve out raw regions.
fn split_raw(body: &str) -> Result<Vec<Segment<'_>>, String> {
    let mut segments = Vec::new();
    let mut rest = body;
    while let Some(open) = raw_open().find(rest) {
        segments.push(Segment::Text(&rest[..open.start()]));
        let after = &rest[open.end()..];
        let close = raw_close()
            .find(after)
            .ok_or_else(|| "unterminated {% raw %} block".to_string())?;
        segments.push(Segment::Raw(&after[..close.start()]));
        rest = &after[close.end()..];
    }
    segments.push(Segment::Text(rest));
    Ok(segments)
}

fn parse_tag(inner: &str) -> Result<Token, String> {
    let inner = inner.trim();
    if inner.starts_with('-') || inner.ends_with('-') {
        return Err(format!("whitespace control in '{{%{}%}}' is not supported", inner));
    }
    let mut words = inner.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some("if"), Some(key), None) if is_key(key) => Ok(Token::If(key.to_string())),
        (Some("else"), None, None) => Ok(Token::Else),
        (Some("endif"), None, None) => Ok(Token::EndIf),
        (Some("endraw"), None, None) => Err("{% endraw %} without {% raw %}".to_string()),
        _ => Err(format!("unsupported tag '{{% {} %}}'", inner)),
    }
}

/// Pass 2: tokenize the text between raw regions.
fn tokenize(text: &str, out: &mut Vec<Token>) -> Result<(), String> {
    let mut rest = text;
    loop {
        let next = match (rest.find("{{"), rest.find("{%")) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        let Some(start) = next else {
            if !rest.is_empty() {
                out.push(Token::Text(rest.to_string()));
            }
            return Ok(());
        };
        if start > 0 {
            out.push(Token::Text(rest[..start].to_string()));
        }
        let is_var = rest[start..].starts_with("{{");
        let closer = if is_var { "}}" } else { "%}" };
        let body_start = start + 2;
        let end = rest[body_start..]
            .find(closer)
            .map(|i| body_start + i)
            .ok_or_else(|| format!("unterminated '{}' at byte {}", &rest[start..body_start], start))?;
        let inner = &rest[body_start..end];
        if is_var {
            let key = inner.trim();
            if !is_key(key) {
                return Err(format!("invalid placeholder '{{{{{}}}}}'", inner));
            }
            out.push(Token::Var(key.to_string()));
        } else {
            out.push(parse_tag(inner)?);
        }
        rest = &rest[end + 2..];
    }
}

fn parse_block<I: Iterator<Item = Token>>(
    tokens: &mut I,
) -> Result<(Vec<Node>, Option<BlockEnd>), String> {
    let mut nodes = Vec::new();
    while let Some(token) = tokens.next() {
        match token {
            Token::Text(t) => nodes.push(Node::Text(t)),
            Token::Var(k) => nodes.push(Node::Var(k)),
            Token::If(key) => {
                let (then, end) = parse_block(tokens)?;
                let otherwise = match end {
                    Some(BlockEnd::EndIf) => Vec::new(),
                    Some(BlockEnd::Else) => match parse_block(tokens)? {
                        (other, Some(BlockEnd::EndIf)) => other,
                        (_, Some(BlockEnd::Else)) => {
                            return Err(format!("duplicate {{% else %}} in 'if {}'", key));
                        }
                        (_, None) => return Err(format!("unterminated 'if {}' block", key)),
                    },
                    None => return Err(format!("unterminated 'if {}' block", key)),
                };
                nodes.push(Node::If {
                    key,
                    then,
                    otherwise,
                });
            }
            Token::Else => return Ok((nodes, Some(BlockEnd::Else))),
            Token::EndIf => return Ok((nodes, Some(BlockEnd::EndIf))),
        }
    }
    Ok((nodes, None))
}

fn collect_keys<'a>(nodes: &'a [Node], out: &mut Vec<&'a str>) {
    for node in nodes {
        match node {
            Node::Text(_) => {}
            Node::Var(k) => {
                if !out.contains(&k.as_str()) {
                    out.push(k);
                }
            }
            Node::If {
                key,
                then,
                otherwise,
            } => {
                if !out.contains(&key.as_str()) {
                    out.push(key);
                }
                collect_keys(then, out);
                collect_keys(otherwise, out);
            }
        }
    }
}

fn emit(nodes: &[Node], ctx: &RenderContext, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Var(k) => out.push_str(ctx.get(k).unwrap_or_default()),
            Node::If {
                key,
                then,
                otherwise,
            } => {
                let truthy = ctx.get(key).is_some_and(|v| !v.trim().is_empty());
                emit(if truthy { then } else { otherwise }, ctx, out);
            }
        }
    }
}

/// A parsed template body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(name: &str, body: &str) -> Result<Self, PkgsmithError> {
        let syntax = |message: String| PkgsmithError::TemplateSyntax {
            template: name.to_string(),
            message,
        };

        let mut tokens = Vec::new();
        for segment in split_raw(body).map_err(syntax)? {
            match segment {
                Segment::Text(t) => tokenize(t, &mut tokens).map_err(syntax)?,
                Segment::Raw(r) => tokens.push(Token::Text(r.to_string())),
            }
        }

        let mut iter = tokens.into_iter();
        let nodes = match parse_block(&mut iter).map_err(syntax)? {
            (nodes, None) => nodes,
            (_, Some(BlockEnd::Else)) => return Err(syntax("{% else %} without {% if %}".into())),
            (_, Some(BlockEnd::EndIf)) => {
                return Err(syntax("{% endif %} without {% if %}".into()));
            }
        };

        Ok(Self {
            name: name.to_string(),
            nodes,
        })
    }

    /// Keys referenced by the template, in first-use order.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        collect_keys(&self.nodes, &mut keys);
        keys
    }

    pub fn render(&self, ctx: &RenderContext) -> Result<String, PkgsmithError> {
        if let Some(missing) = self.placeholders().into_iter().find(|k| !ctx.contains(k)) {
            return Err(PkgsmithError::UnresolvedPlaceholder {
                template: self.name.clone(),
                placeholder: missing.to_string(),
            });
        }
        let mut out = String::new();
        emit(&self.nodes, ctx, &mut out);
        Ok(out)
    }
}

/// Parse and render a single template body.
pub fn render_str(name: &str, body: &str, ctx: &RenderContext) -> Result<String, PkgsmithError> {
    Template::parse(name, body)?.render(ctx)
}

/// Render a templated relative path and make sure it stays inside the package.
pub fn render_path(name: &str, path: &str, ctx: &RenderContext) -> Result<PathBuf, PkgsmithError> {
    let rendered = render_str(name, path, ctx)?;
    let candidate = Path::new(rendered.trim());
    let escapes = candidate.as_os_str().is_empty()
        || candidate
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(PkgsmithError::TemplateSyntax {
            template: name.to_string(),
            message: format!("output path '{}' is not a relative path inside the package", rendered),
        });
    }
    Ok(candidate.to_path_buf())
}

/// Render every template in the set. Either all files come back or none do.
pub fn render_set(
    set: &TemplateSet,
    ctx: &RenderContext,
) -> Result<Vec<GeneratedFile>, PkgsmithError> {
    let files = set
        .entries()
        .iter()
        .map(|entry| {
            let path = render_path(&entry.source, &entry.output_path, ctx)?;
            let content = render_str(&entry.source, &entry.body, ctx)?;
            Ok(GeneratedFile { path, content })
        })
        .collect::<Result<Vec<_>, PkgsmithError>>()?;
    tracing::debug!(set = set.name(), files = files.len(), "rendered template set");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RenderContext {
        RenderContext::from_pairs([
            ("module_name", "billing_core"),
            ("module_upper", "BILLING_CORE"),
            ("description", "Billing module"),
            ("empty", ""),
        ])
    }

    #[test]
    fn substitutes_placeholders() {
        let out = render_str("t", "{{ module_name }} / {{module_upper}}", &ctx()).unwrap();
        assert_eq!(out, "billing_core / BILLING_CORE");
    }

    #[test]
    fn raw_regions_are_verbatim() {
        let body = "name: {{ module_name }}\n{% raw %}run: ${{ matrix.python }} {{ missing }}{% endraw %}\n";
        let out = render_str("ci.yml", body, &ctx()).unwrap();
        assert_eq!(
            out,
            "name: billing_core\nrun: ${{ matrix.python }} {{ missing }}\n"
        );
    }

    #[test]
    fn conditionals_pick_a_branch() {
        let body = "{% if description %}d={{ description }}{% else %}none{% endif %};{% if empty %}x{% else %}y{% endif %}";
        assert_eq!(render_str("t", body, &ctx()).unwrap(), "d=Billing module;y");
    }

    #[test]
    fn nested_conditionals() {
        let body = "{% if description %}a{% if empty %}b{% endif %}c{% endif %}";
        assert_eq!(render_str("t", body, &ctx()).unwrap(), "ac");
    }

    #[test]
    fn unresolved_placeholder_names_template_and_key() {
        let err = render_str("README.md.tmpl", "{{ module_name }} {{ author }}", &ctx()).unwrap_err();
        match err {
            PkgsmithError::UnresolvedPlaceholder {
                template,
                placeholder,
            } => {
                assert_eq!(template, "README.md.tmpl");
                assert_eq!(placeholder, "author");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn untaken_branch_keys_must_still_resolve() {
        let err = render_str("t", "{% if empty %}{{ author }}{% endif %}", &ctx()).unwrap_err();
        assert!(matches!(err, PkgsmithError::UnresolvedPlaceholder { .. }));
    }

    #[test]
    fn malformed_templates_are_syntax_errors() {
        for body in [
            "{{ module_name",
            "{% raw %}never closed",
            "{% if description %}open",
            "{% endif %}",
            "{% else %}",
            "{% for x in y %}{% endfor %}",
            "{{ not a key }}",
            "{% if description %}a{% else %}b{% else %}c{% endif %}",
            "{%- if description %}a{% endif %}",
            "{% if description -%}a{% endif %}",
            "{%- raw %}x{% endraw %}",
            "{% raw %}x{% endraw -%}",
            "{{- module_name }}",
        ] {
            let err = render_str("t", body, &ctx()).unwrap_err();
            assert!(
                matches!(err, PkgsmithError::TemplateSyntax { .. }),
                "expected syntax error for {:?}, got {:?}",
                body,
                err
            );
        }
    }

    #[test]
    fn placeholders_listed_in_first_use_order() {
        let t = Template::parse("t", "{{ b }}{% if a %}{{ b }}{{ c }}{% endif %}").unwrap();
        assert_eq!(t.placeholders(), vec!["b", "a", "c"]);
    }

    #[test]
    fn paths_must_stay_relative() {
        assert_eq!(
            render_path("p", "src/{{ module_name }}/__init__.py", &ctx()).unwrap(),
            PathBuf::from("src/billing_core/__init__.py")
        );
        assert!(render_path("p", "../escape.py", &ctx()).is_err());
        assert!(render_path("p", "/etc/passwd", &ctx()).is_err());
        assert!(render_path("p", "{{ empty }}", &ctx()).is_err());
    }
}

//! Source files under review and the lightweight Python lexer the roles share.
//!
//! The lexer is line oriented: it separates comments from code, blanks the
//! contents of string literals (keeping the quotes, so `x = ""` still reads
//! as an assignment of a literal) and follows triple-quoted strings across
//! lines. [`Outline`] adds just enough structure on top (functions, classes,
//! their extents by indentation) for size and documentation rules. It is not
//! a parser; code that only a real parser could see through is missed.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("unterminated triple-quoted string starting on line {line}")]
    UnterminatedString { line: usize },
    #[error("signature starting on line {line} is never closed")]
    UnclosedSignature { line: usize },
}

impl SourceError {
    pub fn line(&self) -> usize {
        match self {
            Self::UnterminatedString { line } | Self::UnclosedSignature { line } => *line,
        }
    }
}

/// Whether the package owning a file ships an API description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiSpec {
    Present,
    Missing,
    /// The file is not inside a recognizable package.
    Unknown,
}

/// One changed file, as handed to every role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
    pub api_spec: ApiSpec,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            api_spec: ApiSpec::Unknown,
        }
    }

    pub fn with_api_spec(mut self, api_spec: ApiSpec) -> Self {
        self.api_spec = api_spec;
        self
    }

    /// Test modules are allowed asserts, prints, and debugger hooks.
    pub fn is_test(&self) -> bool {
        let name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if name.starts_with("test_") || name.ends_with("_test.py") || name == "conftest.py" {
            return true;
        }
        self.path.components().any(|c| match c {
            Component::Normal(part) => part == "tests" || part == "test",
            _ => false,
        })
    }

    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }

    pub fn lines(&self) -> Result<Vec<Line<'_>>, SourceError> {
        lex(&self.content)
    }

    pub fn outline(&self) -> Result<Outline, SourceError> {
        Outline::build(&self.lines()?)
    }
}

/// A physical source line split into code, comment, and string literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number.
    pub number: usize,
    pub raw: &'a str,
    /// Code with string contents removed and the comment stripped.
    pub code: String,
    /// Comment text after `#`, if any.
    pub comment: Option<&'a str>,
    /// Literals that start on this line (full text for multi-line strings).
    pub strings: Vec<String>,
    /// The line begins inside a string opened on an earlier line.
    pub in_string: bool,
}

impl Line<'_> {
    pub fn indent(&self) -> usize {
        indent_width(self.raw)
    }

    pub fn is_blank(&self) -> bool {
        self.raw.trim().is_empty()
    }

    /// Nothing but whitespace and/or a comment.
    pub fn is_code_free(&self) -> bool {
        !self.in_string && self.code.trim().is_empty()
    }
}

fn indent_width(raw: &str) -> usize {
    raw.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

struct OpenString {
    quote: char,
    start_line: usize,
    /// Index of the opening line in the lexed output.
    line_index: usize,
    /// Index into that line's `strings`.
    slot: usize,
}

/// Split `content` into lexed lines.
pub fn lex(content: &str) -> Result<Vec<Line<'_>>, SourceError> {
    let mut lines: Vec<Line<'_>> = Vec::new();
    let mut open: Option<OpenString> = None;

    for (idx, raw) in content.lines().enumerate() {
        let mut line = Line {
            number: idx + 1,
            raw,
            code: String::new(),
            comment: None,
            strings: Vec::new(),
            in_string: open.is_some(),
        };
        let chars: Vec<(usize, char)> = raw.char_indices().collect();
        let mut i = 0;

        while i < chars.len() {
            if let Some(state) = &open {
                let (q, start_line, line_index, slot) =
                    (state.quote, state.start_line, state.line_index, state.slot);
                let closes = chars[i].1 == q
                    && chars.get(i + 1).map(|c| c.1) == Some(q)
                    && chars.get(i + 2).map(|c| c.1) == Some(q);
                if closes {
                    line.code.push_str(&q.to_string().repeat(3));
                    open = None;
                    i += 3;
                    continue;
                }
                let c = chars[i].1;
                let target = if start_line == line.number {
                    &mut line.strings[slot]
                } else {
                    &mut lines[line_index].strings[slot]
                };
                target.push(c);
                if c == '\\' {
                    if let Some(next) = chars.get(i + 1) {
                        target.push(next.1);
                        i += 1;
                    }
                }
                i += 1;
                continue;
            }

            let (pos, c) = chars[i];
            match c {
                '#' => {
                    line.comment = Some(&raw[pos + 1..]);
                    break;
                }
                '"' | '\'' => {
                    let triple = chars.get(i + 1).map(|c| c.1) == Some(c)
                        && chars.get(i + 2).map(|c| c.1) == Some(c);
                    if triple {
                        line.code.push_str(&c.to_string().repeat(3));
                        line.strings.push(String::new());
                        open = Some(OpenString {
                            quote: c,
                            start_line: line.number,
                            line_index: idx,
                            slot: line.strings.len() - 1,
                        });
                        i += 3;
                        continue;
                    }
                    // Single-quoted literal: ends on this line.
                    line.code.push(c);
                    let mut literal = String::new();
                    i += 1;
                    while i < chars.len() {
                        let ch = chars[i].1;
                        if ch == '\\' {
                            literal.push(ch);
                            if let Some(next) = chars.get(i + 1) {
                                literal.push(next.1);
                            }
                            i += 2;
                            continue;
                        }
                        if ch == c {
                            line.code.push(c);
                            i += 1;
                            break;
                        }
                        literal.push(ch);
                        i += 1;
                    }
                    line.strings.push(literal);
                }
                _ => {
                    line.code.push(c);
                    i += 1;
                }
            }
        }

        if let Some(state) = &open {
            // A newline inside a multi-line string belongs to the literal.
            if state.start_line == line.number {
                line.strings[state.slot].push('\n');
            } else {
                lines[state.line_index].strings[state.slot].push('\n');
            }
        }
        lines.push(line);
    }

    match open {
        Some(state) => Err(SourceError::UnterminatedString {
            line: state.start_line,
        }),
        None => Ok(lines),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Function,
    Class,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub annotated: bool,
    /// `*args` or `**kwargs`.
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub name: String,
    /// Line of the `def`/`class` keyword.
    pub line: usize,
    /// Last non-blank line of the body.
    pub end_line: usize,
    pub indent: usize,
    pub params: Vec<Param>,
    pub returns_annotated: bool,
    pub has_docstring: bool,
    /// Index of the enclosing block in [`Outline::blocks`].
    pub parent: Option<usize>,
}

impl Block {
    /// Lines from the header to the end of the body, inclusive.
    pub fn line_span(&self) -> usize {
        self.end_line - self.line + 1
    }

    pub fn is_public(&self) -> bool {
        !self.name.starts_with('_')
    }
}

/// Functions and classes of a file, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    pub blocks: Vec<Block>,
    /// Line numbers of `import` / `from ... import` statements.
    pub imports: Vec<usize>,
}

fn keyword_header(code: &str) -> Option<(BlockKind, &str)> {
    let trimmed = code.trim_start();
    let rest = trimmed.strip_prefix("async ").map(str::trim_start).unwrap_or(trimmed);
    if let Some(r) = rest.strip_prefix("def ") {
        return Some((BlockKind::Function, r.trim_start()));
    }
    if trimmed.starts_with("class ") {
        return Some((BlockKind::Class, trimmed["class ".len()..].trim_start()));
    }
    None
}

fn identifier_prefix(s: &str) -> &str {
    let end = s
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    &s[..end]
}

/// Split on commas that are not nested inside brackets.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn parse_params(list: &str) -> Vec<Param> {
    split_top_level(list)
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty() && *p != "*" && *p != "/")
        .map(|p| {
            let variadic = p.starts_with('*');
            let bare = p.trim_start_matches('*');
            let name = identifier_prefix(bare).to_string();
            let after_name = bare[name.len()..].trim_start();
            Param {
                name,
                annotated: after_name.starts_with(':'),
                variadic,
            }
        })
        .collect()
}

struct Header {
    /// Text between the outer parentheses of the signature.
    params: String,
    returns_annotated: bool,
    /// Index of the line holding the terminating `:`.
    end_index: usize,
    /// Code after the `:` on that line.
    inline_body: String,
}

fn read_header(lines: &[Line<'_>], start: usize, kind: BlockKind) -> Result<Header, SourceError> {
    let mut depth = 0i32;
    let mut seen_paren = false;
    let mut params = String::new();
    let mut after_params = String::new();

    for (offset, line) in lines[start..].iter().enumerate() {
        let code = &line.code;
        let begin = if offset == 0 {
            code.find(|c| c == '(' || c == ':').unwrap_or(code.len())
        } else {
            0
        };
        for (i, c) in code[begin..].char_indices() {
            match c {
                '(' | '[' | '{' => {
                    if depth == 0 && c == '(' && !seen_paren {
                        seen_paren = true;
                        depth += 1;
                        continue;
                    }
                    depth += 1;
                }
                ')' | ']' | '}' => {
                    depth -= 1;
                    if depth == 0 && c == ')' && seen_paren && after_params.is_empty() {
                        after_params.push(' ');
                        continue;
                    }
                }
                ':' if depth == 0 => {
                    return Ok(Header {
                        params: if kind == BlockKind::Function { params } else { String::new() },
                        returns_annotated: after_params.contains("->"),
                        end_index: start + offset,
                        inline_body: code[begin + i + 1..].trim().to_string(),
                    });
                }
                _ => {}
            }
            if depth >= 1 && seen_paren && after_params.is_empty() {
                params.push(c);
            } else if seen_paren {
                after_params.push(c);
            }
        }
        if depth >= 1 {
            params.push(' ');
        }
    }

    Err(SourceError::UnclosedSignature {
        line: lines[start].number,
    })
}

fn starts_with_string(code: &str) -> bool {
    let trimmed = code.trim_start();
    let rest = trimmed.trim_start_matches(|c: char| matches!(c, 'r' | 'R' | 'u' | 'U' | 'b' | 'B' | 'f' | 'F'));
    rest.starts_with('"') || rest.starts_with('\'')
}

fn is_import(code: &str) -> bool {
    let t = code.trim_start();
    t.starts_with("import ") || (t.starts_with("from ") && t.contains(" import"))
}

impl Outline {
    pub fn build(lines: &[Line<'_>]) -> Result<Self, SourceError> {
        let mut outline = Outline::default();
        // (block index, indent) of blocks still open at the current line.
        let mut open: Vec<(usize, usize)> = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = &lines[i];
            if line.in_string || line.is_code_free() {
                i += 1;
                continue;
            }
            let indent = line.indent();
            while open.last().is_some_and(|(_, ind)| *ind >= indent) {
                open.pop();
            }
            if is_import(&line.code) {
                outline.imports.push(line.number);
            }

            let Some((kind, rest)) = keyword_header(&line.code) else {
                i += 1;
                continue;
            };
            let name = identifier_prefix(rest).to_string();
            if name.is_empty() {
                i += 1;
                continue;
            }
            let header = read_header(lines, i, kind)?;
            let (end_line, has_docstring) = if header.inline_body.is_empty() {
                body_extent(lines, header.end_index, indent)
            } else {
                (
                    lines[header.end_index].number,
                    starts_with_string(&header.inline_body),
                )
            };

            let index = outline.blocks.len();
            outline.blocks.push(Block {
                kind,
                name,
                line: line.number,
                end_line,
                indent,
                params: parse_params(&header.params),
                returns_annotated: header.returns_annotated,
                has_docstring,
                parent: open.last().map(|(idx, _)| *idx),
            });
            open.push((index, indent));
            // Continuation lines of the signature hold no further headers.
            i = header.end_index + 1;
        }

        Ok(outline)
    }

    pub fn functions(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(|b| b.kind == BlockKind::Function)
    }

    pub fn classes(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(|b| b.kind == BlockKind::Class)
    }

    pub fn parent_of(&self, block: &Block) -> Option<&Block> {
        block.parent.map(|p| &self.blocks[p])
    }

    /// Functions defined directly in the body of the class at `class_index`.
    pub fn methods_of(&self, class_index: usize) -> impl Iterator<Item = &Block> {
        self.blocks
            .iter()
            .filter(move |b| b.kind == BlockKind::Function && b.parent == Some(class_index))
    }

    /// Module-level functions and methods of classes; nested helpers are excluded.
    pub fn api_functions(&self) -> impl Iterator<Item = &Block> {
        self.functions().filter(|f| match self.parent_of(f) {
            None => true,
            Some(parent) => parent.kind == BlockKind::Class,
        })
    }
}

/// Last line of the body that follows the header ending at `header_end`, and
/// whether that body opens with a docstring.
fn body_extent(lines: &[Line<'_>], header_end: usize, indent: usize) -> (usize, bool) {
    let mut end = lines[header_end].number;
    let mut docstring = None;
    for line in &lines[header_end + 1..] {
        if line.is_blank() || (line.is_code_free() && !line.in_string) {
            continue;
        }
        if !line.in_string && line.indent() <= indent {
            break;
        }
        if docstring.is_none() && !line.in_string {
            docstring = Some(starts_with_string(&line.code));
        }
        end = line.number;
    }
    (end, docstring.unwrap_or(false))
}

/// Nearest directory at or above `file`'s parent that holds a `pyproject.toml`.
/// The search stops at a directory named `packages` (the monorepo root of all
/// packages) and at the filesystem root.
pub fn package_root(file: &Path) -> Option<PathBuf> {
    let mut dir = file.parent()?;
    loop {
        if dir.file_name().is_some_and(|n| n == "packages") {
            return None;
        }
        if dir.join("pyproject.toml").is_file() {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}

pub fn detect_api_spec(file: &Path) -> ApiSpec {
    match package_root(file) {
        None => ApiSpec::Unknown,
        Some(root) => {
            let present = ["openapi.yaml", "openapi.yml", "openapi.json"]
                .iter()
                .any(|name| root.join(name).is_file());
            if present { ApiSpec::Present } else { ApiSpec::Missing }
        }
    }
}

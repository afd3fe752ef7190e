//! A single contract source file and what the flattener needs from it.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::flatten::lexer::{self, Token, TokenKind};
use crate::flatten::FlattenError;

static LICENSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"SPDX-License-Identifier:\s*(\S+)").expect("valid regex"));

static PRAGMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pragma\s+solidity\s+([^;]+);").expect("valid regex"));

/// Keywords that open a top-level type declaration.
const DECLARATION_KEYWORDS: &[&str] = &["contract", "interface", "library", "abstract"];

/// An import statement's target as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTarget {
    /// The unresolved path string.
    pub path: String,
    /// Byte span of the path literal, quotes included.
    pub span: Range<usize>,
}

/// A parsed contract source file.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    path: PathBuf,
    text: String,
    /// Imports, last-declared first.
    imports: Vec<ImportTarget>,
    license: Option<String>,
    pragma: Option<String>,
    primary: Option<String>,
    body: String,
}

impl SourceUnit {
    /// Read and parse the file at `path`.
    pub fn load(path: &Path) -> Result<Self, FlattenError> {
        let text = std::fs::read_to_string(path).map_err(|source| FlattenError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, text)
    }

    /// Parse source text that was read from `path`.
    pub fn parse(path: &Path, text: String) -> Result<Self, FlattenError> {
        let tokens = lexer::tokenize(&text)
            .map_err(|e| FlattenError::parse(path, &text, e.message, e.offset, e.len))?;
        let stripped = lexer::strip_comments(&text, &tokens);
        let code: Vec<&Token> = tokens.iter().filter(|t| !t.is_comment()).collect();

        let mut imports = extract_imports(&text, &code);
        imports.reverse();

        let body_span = body_span(path, &text, &code)?;
        let body = body_span
            .map(|span| stripped[span].trim().to_string())
            .unwrap_or_default();

        let license = LICENSE_RE
            .captures(&text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());

        let pragma = PRAGMA_RE
            .captures(&stripped)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string());

        Ok(SourceUnit {
            path: path.to_path_buf(),
            primary: primary_type_name(&text, &code),
            text,
            imports,
            license,
            pragma,
            body,
        })
    }

    /// Path the unit was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw file contents.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Import targets, last-declared first.
    pub fn imports(&self) -> &[ImportTarget] {
        &self.imports
    }

    /// SPDX license identifier, if declared.
    pub fn license(&self) -> Option<&str> {
        self.license.as_deref()
    }

    /// `pragma solidity` version constraint, if declared.
    pub fn pragma(&self) -> Option<&str> {
        self.pragma.as_deref()
    }

    /// Name of the first declared contract, interface or library.
    pub fn primary_type(&self) -> Option<&str> {
        self.primary.as_deref()
    }

    /// Comment-free text from the first declaration to the last top-level
    /// closing brace. Empty when the file declares no types.
    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Find `import ... "<path>" ...;` statements at the top level.
fn extract_imports(text: &str, code: &[&Token]) -> Vec<ImportTarget> {
    let mut imports = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < code.len() {
        let token = code[i];
        match token.kind {
            TokenKind::LBrace => depth += 1,
            TokenKind::RBrace => depth = depth.saturating_sub(1),
            TokenKind::Word if depth == 0 && token.text(text) == "import" => {
                // The path is the first string literal before the `;`. Inside
                // `{A, B}` braces of a named import there are no strings.
                let mut j = i + 1;
                while j < code.len() && code[j].kind != TokenKind::Semi {
                    if let Some(path) = code[j].string_contents(text) {
                        imports.push(ImportTarget {
                            path: path.to_string(),
                            span: code[j].span.clone(),
                        });
                        break;
                    }
                    j += 1;
                }
                while j < code.len() && code[j].kind != TokenKind::Semi {
                    j += 1;
                }
                i = j;
            }
            _ => {}
        }
        i += 1;
    }

    imports
}

/// Span from the first top-level declaration keyword to the end of the last
/// top-level braced item.
fn body_span(
    path: &Path,
    text: &str,
    code: &[&Token],
) -> Result<Option<Range<usize>>, FlattenError> {
    let mut depth = 0usize;
    let mut start = None;
    let mut end = None;
    let mut open = Vec::new();

    for token in code {
        match token.kind {
            TokenKind::LBrace => {
                depth += 1;
                open.push(token.span.start);
            }
            TokenKind::RBrace => {
                if depth == 0 {
                    return Err(FlattenError::parse(
                        path,
                        text,
                        "unexpected `}`",
                        token.span.start,
                        1,
                    ));
                }
                depth -= 1;
                open.pop();
                if depth == 0 && start.is_some() {
                    end = Some(token.span.end);
                }
            }
            TokenKind::Word
                if depth == 0
                    && start.is_none()
                    && DECLARATION_KEYWORDS.contains(&token.text(text)) =>
            {
                start = Some(token.span.start);
            }
            _ => {}
        }
    }

    if let Some(&offset) = open.last() {
        return Err(FlattenError::parse(path, text, "unclosed `{`", offset, 1));
    }

    Ok(match (start, end) {
        (Some(start), Some(end)) => Some(start..end),
        _ => None,
    })
}

/// `contract X`, `interface X`, `library X` or `abstract contract X`.
fn primary_type_name(text: &str, code: &[&Token]) -> Option<String> {
    let mut depth = 0usize;
    for (i, token) in code.iter().enumerate() {
        match token.kind {
            TokenKind::LBrace => depth += 1,
            TokenKind::RBrace => depth = depth.saturating_sub(1),
            TokenKind::Word if depth == 0 => {
                let name_at = match token.text(text) {
                    "contract" | "interface" | "library" => i + 1,
                    "abstract" => i + 2,
                    _ => continue,
                };
                return code
                    .get(name_at)
                    .filter(|t| t.kind == TokenKind::Word)
                    .map(|t| t.text(text).to_string());
            }
            _ => {}
        }
    }
    None
}

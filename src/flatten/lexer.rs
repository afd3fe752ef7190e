//! Minimal tokenizer for contract sources.
//!
//! The flattener only needs to know where comments, string literals,
//! identifiers and braces are. Everything else is punctuation. Offsets are
//! byte offsets into the original text and always fall on char boundaries.

use std::ops::Range;

/// Kind of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier, keyword or number literal.
    Word,
    /// Single- or double-quoted string literal, quotes included.
    Str,
    LBrace,
    RBrace,
    Semi,
    /// Any other single character.
    Punct,
    LineComment,
    BlockComment,
}

/// A token with its byte span in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl Token {
    /// The token's text within `src`.
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.span.clone()]
    }

    /// Whether this token is a comment.
    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment)
    }

    /// For a string token, the literal contents without the quotes.
    pub fn string_contents<'a>(&self, src: &'a str) -> Option<&'a str> {
        if self.kind != TokenKind::Str {
            return None;
        }
        let text = self.text(src);
        Some(&text[1..text.len() - 1])
    }
}

/// A lexing failure at a byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub offset: usize,
    pub len: usize,
}

/// Tokenize `src`. Whitespace is skipped.
pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let kind = match c {
            c if c.is_whitespace() => continue,
            '/' if matches!(chars.peek(), Some((_, '/'))) => {
                while let Some(&(_, next)) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
                TokenKind::LineComment
            }
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                let mut prev = '\0';
                let mut closed = false;
                for (_, next) in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        closed = true;
                        break;
                    }
                    prev = next;
                }
                if !closed {
                    return Err(LexError {
                        message: "unterminated block comment".to_string(),
                        offset: start,
                        len: 2,
                    });
                }
                TokenKind::BlockComment
            }
            '"' | '\'' => {
                let quote = c;
                let mut escaped = false;
                let mut closed = false;
                while let Some((_, next)) = chars.next() {
                    if next == '\n' {
                        break;
                    }
                    if escaped {
                        escaped = false;
                    } else if next == '\\' {
                        escaped = true;
                    } else if next == quote {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(LexError {
                        message: "unterminated string literal".to_string(),
                        offset: start,
                        len: 1,
                    });
                }
                TokenKind::Str
            }
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ';' => TokenKind::Semi,
            c if is_word_char(c) => {
                while let Some(&(_, next)) = chars.peek() {
                    if !is_word_char(next) {
                        break;
                    }
                    chars.next();
                }
                TokenKind::Word
            }
            _ => TokenKind::Punct,
        };

        let end = chars.peek().map_or(src.len(), |&(i, _)| i);
        tokens.push(Token {
            kind,
            span: start..end,
        });
    }

    Ok(tokens)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Blank out every comment in `src`, keeping newlines so offsets and line
/// numbers stay valid.
pub fn strip_comments(src: &str, tokens: &[Token]) -> String {
    let mut bytes = src.as_bytes().to_vec();
    for token in tokens.iter().filter(|t| t.is_comment()) {
        for b in &mut bytes[token.span.clone()] {
            if *b != b'\n' {
                *b = b' ';
            }
        }
    }
    // Whole chars were replaced, so this never actually loses data.
    String::from_utf8_lossy(&bytes).into_owned()
}

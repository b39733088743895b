//! Lexer for the C/C++ header subset.
//!
//! Produces tokens with byte offsets and line/column positions. Comments
//! are kept as tokens; preprocessor directives are kept as a single token
//! so that the scanner can skip them.

use thiserror::Error;

use crate::core::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    Str,
    Char,
    Punct,
    LineComment,
    BlockComment,
    Preprocessor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
    pub start_pos: Position,
    /// Position of the last character
    pub end_pos: Position,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct LexError {
    pub message: String,
    pub position: Position,
}

const MULTI_PUNCT: [&str; 15] = [
    "...", "::", "->", "&&", "||", "==", "!=", "<=", ">=", "+=", "-=", "*=", "/=", "++", "--",
];

struct Cursor<'a> {
    source: &'a str,
    offset: usize,
    line: u32,
    column: u32,
    /// Only whitespace seen since the last newline
    at_line_start: bool,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.source[self.offset..].chars().nth(n)
    }

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
            self.at_line_start = true;
        } else {
            self.column += 1;
            if !c.is_whitespace() {
                self.at_line_start = false;
            }
        }
        Some(c)
    }
}

/// Tokenize `source`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut cursor = Cursor {
        source,
        offset: 0,
        line: 1,
        column: 1,
        at_line_start: true,
    };
    let mut tokens = Vec::new();

    while let Some(c) = cursor.peek() {
        if c.is_whitespace() {
            cursor.bump();
            continue;
        }

        let start = cursor.offset;
        let start_pos = cursor.position();
        let mut last_pos = start_pos;

        let kind = if c == '#' && cursor.at_line_start {
            // Directive runs to the end of the line, honoring `\` continuations
            let mut prev = '\0';
            while let Some(ch) = cursor.peek() {
                if ch == '\n' && prev != '\\' {
                    break;
                }
                if ch != '\r' {
                    prev = ch;
                }
                last_pos = cursor.position();
                cursor.bump();
            }
            TokenKind::Preprocessor
        } else if cursor.rest().starts_with("//") {
            while let Some(ch) = cursor.peek() {
                if ch == '\n' {
                    break;
                }
                last_pos = cursor.position();
                cursor.bump();
            }
            TokenKind::LineComment
        } else if cursor.rest().starts_with("/*") {
            cursor.bump();
            cursor.bump();
            loop {
                if cursor.rest().starts_with("*/") {
                    cursor.bump();
                    last_pos = cursor.position();
                    cursor.bump();
                    break;
                }
                if cursor.bump().is_none() {
                    return Err(LexError {
                        message: "unterminated block comment".to_string(),
                        position: start_pos,
                    });
                }
            }
            TokenKind::BlockComment
        } else if c == '"' || c == '\'' {
            lex_quoted(&mut cursor, c, start_pos, &mut last_pos)?;
            if c == '"' {
                TokenKind::Str
            } else {
                TokenKind::Char
            }
        } else if c.is_alphabetic() || c == '_' {
            while let Some(ch) = cursor.peek() {
                if !(ch.is_alphanumeric() || ch == '_') {
                    break;
                }
                last_pos = cursor.position();
                cursor.bump();
            }
            // String literal prefixes: u8"..", L"..", R"(..)" are lexed as strings
            if let Some(q @ ('"' | '\'')) = cursor.peek() {
                let prefix = &source[start..cursor.offset];
                if matches!(prefix, "u8" | "u" | "U" | "L") {
                    lex_quoted(&mut cursor, q, start_pos, &mut last_pos)?;
                    let kind = if q == '"' { TokenKind::Str } else { TokenKind::Char };
                    tokens.push(Token {
                        kind,
                        start,
                        end: cursor.offset,
                        start_pos,
                        end_pos: last_pos,
                    });
                    continue;
                }
            }
            TokenKind::Ident
        } else if c.is_ascii_digit()
            || (c == '.' && cursor.peek_at(1).is_some_and(|d| d.is_ascii_digit()))
        {
            let mut prev = '\0';
            while let Some(ch) = cursor.peek() {
                let exponent_sign =
                    (ch == '+' || ch == '-') && matches!(prev, 'e' | 'E' | 'p' | 'P');
                if !(ch.is_ascii_alphanumeric() || ch == '.' || ch == '\'' || exponent_sign) {
                    break;
                }
                prev = ch;
                last_pos = cursor.position();
                cursor.bump();
            }
            TokenKind::Number
        } else {
            let rest = cursor.rest();
            let len = MULTI_PUNCT
                .iter()
                .find(|p| rest.starts_with(**p))
                .map_or(1, |p| p.chars().count());
            for _ in 0..len {
                last_pos = cursor.position();
                cursor.bump();
            }
            TokenKind::Punct
        };

        tokens.push(Token {
            kind,
            start,
            end: cursor.offset,
            start_pos,
            end_pos: last_pos,
        });
    }

    Ok(tokens)
}

fn lex_quoted(
    cursor: &mut Cursor<'_>,
    quote: char,
    start_pos: Position,
    last_pos: &mut Position,
) -> Result<(), LexError> {
    cursor.bump();
    loop {
        let pos = cursor.position();
        match cursor.bump() {
            Some('\\') => {
                cursor.bump();
            }
            Some(ch) if ch == quote => {
                *last_pos = pos;
                return Ok(());
            }
            Some('\n') | None => {
                return Err(LexError {
                    message: "unterminated literal".to_string(),
                    position: start_pos,
                });
            }
            Some(_) => {}
        }
    }
}

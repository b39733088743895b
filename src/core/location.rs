//! Source positions and spans.
//!
//! Every record produced by a declaration source carries a [`Span`]; the
//! BIR keeps only the start of it as a [`Location`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// A 1-based line/column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }
}

/// A contiguous region of one input file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub file: String,
    pub start: Position,
    pub end: Position,
}

impl Span {
    /// Create a span covering `start..=end` in `file`.
    pub fn new(file: impl Into<String>, start: Position, end: Position) -> Self {
        Span {
            file: file.into(),
            start,
            end,
        }
    }

    /// A span that starts and ends on the same position.
    pub fn point(file: impl Into<String>, line: u32, column: u32) -> Self {
        let pos = Position::new(line, column);
        Span::new(file, pos, pos)
    }

    /// Extend this span so it ends where `other` ends.
    pub fn to(&self, other: &Span) -> Span {
        Span::new(self.file.clone(), self.start, other.end)
    }

    pub fn start_line(&self) -> u32 {
        self.start.line
    }

    pub fn end_line(&self) -> u32 {
        self.end.line
    }

    /// The location of the first character of the span.
    pub fn location(&self) -> Location {
        Location {
            file: self.file.clone(),
            line: self.start.line,
            column: self.start.column,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.start.line, self.start.column)
    }
}

/// A point in an input file, as recorded in the BIR.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Location {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_to_keeps_start_and_takes_end() {
        let a = Span::new("a.h", Position::new(3, 5), Position::new(3, 9));
        let b = Span::new("a.h", Position::new(7, 1), Position::new(9, 2));
        let joined = a.to(&b);

        assert_eq!(joined.start, Position::new(3, 5));
        assert_eq!(joined.end, Position::new(9, 2));
        assert_eq!(joined.location(), Location::new("a.h", 3, 5));
    }

    #[test]
    fn test_location_display() {
        assert_eq!(Location::new("include/x.h", 12, 4).to_string(), "include/x.h:12:4");
    }
}

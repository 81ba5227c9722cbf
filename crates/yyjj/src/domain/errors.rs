//! Domain-specific errors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Zero-based line/column pair inside a buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Region of a buffer an error refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    /// A span covering a single position.
    pub const fn point(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }
}

/// Rejection reported by a converter for a buffer's current text.
///
/// Positions are zero-based; [`ParseError::location`] and the `Display` impl present them
/// 1-based for humans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    /// Error located at a single zero-based position.
    pub fn at(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::new(message, Span::point(Position::new(line, column)))
    }

    /// Fixed error recorded when an imported file could not be read.
    pub fn read_failure() -> Self {
        Self::new(READ_FAILURE_MESSAGE, Span::default())
    }

    /// Human-facing location of the span start.
    pub fn location(&self) -> Location {
        Location {
            line: self.span.start.line + 1,
            column: self.span.start.column + 1,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.location())
    }
}

impl std::error::Error for ParseError {}

pub const READ_FAILURE_MESSAGE: &str = "Failed to read file";

/// 1-based location rendered as `Line L, Column C`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}, Column {}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_is_one_based() {
        let err = ParseError::at("unexpected end", 0, 7);
        assert_eq!(err.location(), Location { line: 1, column: 8 });
        assert_eq!(err.to_string(), "unexpected end (Line 1, Column 8)");
    }

    #[test]
    fn read_failure_has_zero_span() {
        let err = ParseError::read_failure();
        assert_eq!(err.message, "Failed to read file");
        assert_eq!(err.span, Span::default());
        assert_eq!(err.location().to_string(), "Line 1, Column 1");
    }
}

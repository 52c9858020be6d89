//! Source location tracking for error reporting.
//!
//! Provides [`Span`] to record where a definition or reference was written.

use std::fmt;

/// A span of source text, represented by its starting position.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    /// Create a new span from a line, column, and length.
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// Create a zero-length span at a position.
    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self { line, col, len: 0 }
    }

    /// Whether this span carries no position (synthesized nodes).
    #[inline]
    pub fn is_synthetic(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({}:{}+{})", self.line, self.col, self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_line_and_column() {
        assert_eq!(Span::new(3, 14, 2).to_string(), "3:14");
    }

    #[test]
    fn default_span_is_synthetic() {
        assert!(Span::default().is_synthetic());
        assert!(!Span::point(1, 1).is_synthetic());
    }
}

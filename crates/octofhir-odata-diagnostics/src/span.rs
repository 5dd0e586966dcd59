//! Source span and location tracking for URI parsing
//!
//! Request paths and query option values are single-line inputs, so a
//! location is an offset and a length into the text the parser was given,
//! plus the 1-based column a human would count.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// A span in the input text, represented as a byte range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    /// Create a new span from start and end offsets
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Create a zero-width span at a position
    #[inline]
    pub const fn point(pos: usize) -> Self {
        Self { start: pos, end: pos }
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Merge two spans into one that covers both
    #[inline]
    pub fn merge(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Shift the span right by `offset` bytes.
    ///
    /// Query option values are lexed on their own; shifting re-bases their
    /// spans onto the full query string.
    #[inline]
    pub const fn shifted(self, offset: usize) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }

    /// The slice of `source` covered by this span, clamped to the source
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        let end = self.end.min(source.len());
        let start = self.start.min(end);
        source.get(start..end).unwrap_or("")
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.start..span.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Location of an offending slice within a path or query option value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Column number (1-based, counted in characters)
    pub column: usize,
    /// Byte offset from start (0-based)
    pub offset: usize,
    /// Length in bytes
    pub length: usize,
    /// The offending slice of the input
    pub snippet: String,
}

impl SourceLocation {
    pub fn new(column: usize, offset: usize, length: usize, snippet: impl Into<String>) -> Self {
        Self {
            column,
            offset,
            length,
            snippet: snippet.into(),
        }
    }

    /// Create from a span and the text it points into
    pub fn from_span(span: Span, source: &str) -> Self {
        Self {
            column: offset_to_column(source, span.start),
            offset: span.start,
            length: span.len(),
            snippet: span.slice(source).to_string(),
        }
    }

    pub const fn span(&self) -> Span {
        Span::new(self.offset, self.offset + self.length)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.snippet.is_empty() {
            write!(f, "column {}", self.column)
        } else {
            write!(f, "column {} ('{}')", self.column, self.snippet)
        }
    }
}

/// Convert a byte offset to a 1-based character column
pub fn offset_to_column(source: &str, offset: usize) -> usize {
    source
        .char_indices()
        .take_while(|(i, _)| *i < offset)
        .count()
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge() {
        let a = Span::new(0, 5);
        let b = Span::new(3, 10);
        assert_eq!(a.merge(b), Span::new(0, 10));
    }

    #[test]
    fn test_location_from_span() {
        let source = "PropertyInt16 eq 'x";
        let loc = SourceLocation::from_span(Span::new(17, 19), source);
        assert_eq!(loc.column, 18);
        assert_eq!(loc.snippet, "'x");
        assert_eq!(loc.to_string(), "column 18 ('x')");
    }

    #[test]
    fn test_slice_is_clamped() {
        assert_eq!(Span::new(2, 99).slice("abcd"), "cd");
        assert_eq!(Span::new(9, 12).slice("abcd"), "");
    }
}

//! Classified character ranges produced by the scanners.

use crate::config::ColorRole;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Lexical classification of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    /// A keyword from the configured keyword table.
    Keyword,
    /// Line or block comment.
    Comment,
    /// String-like literal: quoted strings, heredocs, template text, regexes, symbols.
    String,
    /// Numeric literal.
    Number,
    /// Identifier (e.g. an INI key).
    Identifier,
    /// Punctuation / separator.
    Punctuation,
    /// Sigil variable (`@ivar`, `$gvar`).
    Variable,
    /// Anything else.
    Unknown,
}

impl SpanKind {
    /// Comments and strings dominate every other classification inside their extent.
    pub fn is_mask(self) -> bool {
        matches!(self, Self::Comment | Self::String)
    }

    /// Kinds that are suppressed when they overlap a mask.
    pub fn is_maskable(self) -> bool {
        matches!(self, Self::Keyword | Self::Variable | Self::Identifier)
    }

    /// The paint role for this kind.
    pub fn color_role(self) -> ColorRole {
        match self {
            Self::Keyword => ColorRole::Keyword,
            Self::Comment => ColorRole::Comment,
            Self::String => ColorRole::String,
            Self::Number => ColorRole::Number,
            Self::Identifier => ColorRole::Identifier,
            Self::Punctuation => ColorRole::Punctuation,
            Self::Variable => ColorRole::Variable,
            Self::Unknown => ColorRole::Plain,
        }
    }
}

/// Which construct produced a comment or string span.
///
/// Used only when resuming a scan in the middle of the document. Coalescing two spans with
/// different markers yields [`SpanMarker::Mixed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpanMarker {
    /// No construct recorded.
    #[default]
    None,
    /// A line comment (ends at the newline it includes).
    LineComment,
    /// A block comment.
    BlockComment,
    /// A quoted literal delimited by this byte.
    Quote(u8),
    /// A heredoc opener or body.
    Heredoc,
    /// Template-literal text.
    Template,
    /// Coalesced from spans with different markers.
    Mixed,
}

impl SpanMarker {
    fn merge(self, other: Self) -> Self {
        if self == other { self } else { Self::Mixed }
    }
}

/// A classified half-open range of document characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
    /// Classification.
    pub kind: SpanKind,
    /// Construct marker for comment/string spans.
    pub marker: SpanMarker,
}

impl Span {
    /// Create a span with no marker.
    pub fn new(start: usize, end: usize, kind: SpanKind) -> Self {
        Self {
            start,
            end,
            kind,
            marker: SpanMarker::None,
        }
    }

    /// Set the construct marker.
    pub fn with_marker(mut self, marker: SpanMarker) -> Self {
        self.marker = marker;
        self
    }

    /// The span as a `Range`.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span is empty.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Whether `pos` lies inside the span.
    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }

    /// Whether the span overlaps `range`.
    pub fn overlaps(&self, range: &Range<usize>) -> bool {
        self.start < range.end && range.start < self.end
    }

    /// Try to extend `self` with `next`, which must not start before `self`.
    ///
    /// Succeeds when both have the same kind and `next` starts at or before `self.end`.
    pub(crate) fn coalesce(&mut self, next: &Span) -> bool {
        if self.kind != next.kind || next.start > self.end {
            return false;
        }
        self.end = self.end.max(next.end);
        self.marker = self.marker.merge(next.marker);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_geometry() {
        let span = Span::new(10, 20, SpanKind::Keyword);
        assert!(span.contains(10));
        assert!(!span.contains(20));
        assert!(span.overlaps(&(19..30)));
        assert!(!span.overlaps(&(20..30)));
        assert!(!span.overlaps(&(0..10)));
        assert_eq!(span.len(), 10);
    }

    #[test]
    fn test_coalesce_same_kind_only() {
        let mut a = Span::new(0, 5, SpanKind::Comment).with_marker(SpanMarker::LineComment);
        let b = Span::new(5, 9, SpanKind::Comment).with_marker(SpanMarker::BlockComment);
        let c = Span::new(9, 12, SpanKind::String);

        assert!(a.coalesce(&b));
        assert_eq!(a.range(), 0..9);
        assert_eq!(a.marker, SpanMarker::Mixed);
        assert!(!a.coalesce(&c));
        assert!(!a.coalesce(&Span::new(10, 12, SpanKind::Comment)));
    }

    #[test]
    fn test_mask_kinds() {
        assert!(SpanKind::Comment.is_mask());
        assert!(SpanKind::String.is_mask());
        assert!(!SpanKind::Number.is_mask());
        assert!(SpanKind::Keyword.is_maskable());
        assert!(!SpanKind::Number.is_maskable());
        assert_eq!(SpanKind::Unknown.color_role(), ColorRole::Plain);
    }
}

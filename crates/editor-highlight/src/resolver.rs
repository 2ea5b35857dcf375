//! Attribute resolution for a visible range.
//!
//! Comments and strings dominate everything inside their extent: their spans are merged into
//! masks, and keyword/variable/identifier spans overlapping a mask are dropped. Survivors are
//! emitted low-priority first and comment/string last, so a renderer that applies paint in
//! emission order lets comments and strings win on overlap.

use crate::config::ColorRole;
use crate::shadow::ShadowBuffer;
use crate::span::Span;
use std::ops::Range;

/// One paint instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    /// Character range, clipped to the query range.
    pub range: Range<usize>,
    /// Paint role.
    pub role: ColorRole,
    /// Display columns covered on the attribute's first line (tabs expanded). An attribute that
    /// continues past its first line ends at that line's last column.
    pub columns: Range<usize>,
}

/// Resolve `spans` (every stored span overlapping `range`) into paint instructions.
pub fn resolve(
    mut spans: Vec<Span>,
    range: Range<usize>,
    shadow: &ShadowBuffer,
    tab_width: usize,
) -> Vec<Attribute> {
    spans.retain(|s| s.overlaps(&range));
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let masks = build_masks(&spans);
    let masked = |span: &Span| {
        let idx = masks.partition_point(|m| m.end <= span.start);
        masks.get(idx).is_some_and(|m| m.start < span.end)
    };

    let (high, low): (Vec<Span>, Vec<Span>) = spans
        .into_iter()
        .filter(|s| !(s.kind.is_maskable() && masked(s)))
        .partition(|s| s.kind.is_mask());

    low.iter()
        .chain(high.iter())
        .map(|span| {
            let clipped = span.start.max(range.start)..span.end.min(range.end);
            Attribute {
                columns: columns(shadow, &clipped, tab_width),
                range: clipped,
                role: span.kind.color_role(),
            }
        })
        .collect()
}

/// Merge comment/string spans (sorted by start) into non-overlapping cover intervals.
fn build_masks(sorted: &[Span]) -> Vec<Range<usize>> {
    let mut masks: Vec<Range<usize>> = Vec::new();
    for span in sorted.iter().filter(|s| s.kind.is_mask()) {
        match masks.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => masks.push(span.range()),
        }
    }
    masks
}

fn columns(shadow: &ShadowBuffer, range: &Range<usize>, tab_width: usize) -> Range<usize> {
    let line = shadow.line_range(range.start);
    let mut content_end = line.end;
    if content_end > line.start && shadow.bytes()[content_end - 1] == b'\n' {
        content_end -= 1;
    }
    let start = shadow.display_column(range.start, tab_width);
    let end = shadow.display_column(range.end.min(content_end).max(range.start), tab_width);
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::SpanKind;
    use pretty_assertions::assert_eq;

    fn roles(attrs: &[Attribute]) -> Vec<(Range<usize>, ColorRole)> {
        attrs.iter().map(|a| (a.range.clone(), a.role)).collect()
    }

    #[test]
    fn test_masked_keywords_are_dropped() {
        let shadow = ShadowBuffer::from_text("x = \"if\" if 1 # end\n");
        let spans = vec![
            Span::new(4, 8, SpanKind::String),
            Span::new(5, 7, SpanKind::Keyword),
            Span::new(9, 11, SpanKind::Keyword),
            Span::new(12, 13, SpanKind::Number),
            Span::new(14, 20, SpanKind::Comment),
            Span::new(16, 19, SpanKind::Keyword),
        ];
        let attrs = resolve(spans, 0..20, &shadow, 4);
        assert_eq!(
            roles(&attrs),
            vec![
                (9..11, ColorRole::Keyword),
                (12..13, ColorRole::Number),
                (4..8, ColorRole::String),
                (14..20, ColorRole::Comment),
            ]
        );
    }

    #[test]
    fn test_numbers_survive_masks() {
        let shadow = ShadowBuffer::from_text("\"a1\"");
        let spans = vec![
            Span::new(0, 4, SpanKind::String),
            Span::new(2, 3, SpanKind::Number),
        ];
        let attrs = resolve(spans, 0..4, &shadow, 4);
        assert_eq!(
            roles(&attrs),
            vec![(2..3, ColorRole::Number), (0..4, ColorRole::String)]
        );
    }

    #[test]
    fn test_clipping_and_columns() {
        let shadow = ShadowBuffer::from_text("\tx = 'abc\ndef'\n");
        let spans = vec![Span::new(5, 14, SpanKind::String)];

        let attrs = resolve(spans.clone(), 0..15, &shadow, 4);
        assert_eq!(attrs[0].range, 5..14);
        assert_eq!(attrs[0].columns, 8..12);

        let attrs = resolve(spans, 10..12, &shadow, 4);
        assert_eq!(attrs[0].range, 10..12);
        assert_eq!(attrs[0].columns, 0..2);
    }

    #[test]
    fn test_empty_input() {
        let shadow = ShadowBuffer::new();
        assert!(resolve(Vec::new(), 0..0, &shadow, 4).is_empty());
    }
}

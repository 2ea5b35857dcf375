//! Two-tier span index: a sorted, coalesced main array plus an unsorted pending overlay.
//!
//! Fresh scanner output is staged into `pending` (after clearing whatever it replaces from both
//! tiers) and folded into `main` in batches by [`SpanStore::merge_pending`]. For any offset at most
//! one stored span is authoritative.

use crate::shadow::ShadowBuffer;
use crate::span::{Span, SpanKind, SpanMarker};
use crate::state::ContinuationState;
use std::ops::Range;

/// Upper bound on backtracking steps during context resolution.
const MAX_BACKTRACK: usize = 256;

/// Main store plus pending overlay.
#[derive(Debug, Clone, Default)]
pub struct SpanStore {
    main: Vec<Span>,
    pending: Vec<Span>,
    // Upper bound on every pending span's end; nothing pending lies at or past it.
    pending_end: usize,
}

impl SpanStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorted, coalesced spans.
    pub fn main(&self) -> &[Span] {
        &self.main
    }

    /// Spans staged since the last merge, in staging order.
    pub fn pending(&self) -> &[Span] {
        &self.pending
    }

    /// Whether both tiers are empty.
    pub fn is_empty(&self) -> bool {
        self.main.is_empty() && self.pending.is_empty()
    }

    /// Drop every span.
    pub fn clear(&mut self) {
        self.main.clear();
        self.pending.clear();
        self.pending_end = 0;
    }

    /// Stage freshly scanned spans. The caller must have cleared their extent first.
    pub fn stage(&mut self, spans: impl IntoIterator<Item = Span>) -> usize {
        let before = self.pending.len();
        for span in spans.into_iter().filter(|s| !s.is_empty()) {
            self.pending_end = self.pending_end.max(span.end);
            self.pending.push(span);
        }
        self.pending.len() - before
    }

    /// Remove `range` from every stored span, splitting spans that straddle it.
    pub fn clear_range(&mut self, range: Range<usize>) {
        if range.is_empty() {
            return;
        }

        let lo = self.first_main_overlapping(range.start);
        let mut hi = lo;
        while hi < self.main.len() && self.main[hi].start < range.end {
            hi += 1;
        }
        if lo < hi {
            let mut kept = Vec::with_capacity(2);
            for span in &self.main[lo..hi] {
                kept.extend(cut(span, &range));
            }
            self.main.splice(lo..hi, kept);
        }

        if range.start < self.pending_end && self.pending.iter().any(|s| s.overlaps(&range)) {
            let pending = std::mem::take(&mut self.pending);
            for span in pending {
                if span.overlaps(&range) {
                    self.pending.extend(cut(&span, &range));
                } else {
                    self.pending.push(span);
                }
            }
        }
    }

    /// Translate both tiers through an edit that replaced `old` with `new_len` characters.
    ///
    /// Spans after the edit move by the length delta. Spans overlapping the edit are stretched
    /// or clipped at its boundary, and spans left empty are dropped.
    pub fn shift(&mut self, old: Range<usize>, new_len: usize) {
        let new_end = old.start + new_len;
        self.main.retain_mut(|span| shift_span(span, &old, new_end));
        self.pending.retain_mut(|span| shift_span(span, &old, new_end));
        self.pending_end = self.pending.iter().map(|s| s.end).max().unwrap_or(0);
    }

    /// Drop every pending span starting at or after `cut`. Returns whether anything was dropped.
    pub fn drop_pending_from(&mut self, cut: usize) -> bool {
        let before = self.pending.len();
        self.pending.retain(|s| s.start < cut);
        self.pending.len() != before
    }

    /// Fold the pending overlay into the main store.
    ///
    /// Stable two-pointer merge by start offset; adjacent same-kind spans coalesce as they are
    /// pushed. Returns the number of spans merged.
    pub fn merge_pending(&mut self) -> usize {
        if self.pending.is_empty() {
            return 0;
        }

        let mut pending = std::mem::take(&mut self.pending);
        self.pending_end = 0;
        pending.sort_by_key(|s| s.start);
        let merged_count = pending.len();

        let main = std::mem::take(&mut self.main);
        let mut merged: Vec<Span> = Vec::with_capacity(main.len() + pending.len());
        let mut push = |span: Span| {
            if let Some(last) = merged.last_mut()
                && last.coalesce(&span)
            {
                return;
            }
            merged.push(span);
        };

        let (mut i, mut j) = (0, 0);
        while i < main.len() && j < pending.len() {
            if main[i].start <= pending[j].start {
                push(main[i]);
                i += 1;
            } else {
                push(pending[j]);
                j += 1;
            }
        }
        main[i..].iter().copied().for_each(&mut push);
        pending[j..].iter().copied().for_each(&mut push);

        self.main = merged;
        merged_count
    }

    /// Every span (both tiers) overlapping `range`, in no particular order.
    pub fn overlapping(&self, range: Range<usize>) -> Vec<Span> {
        let mut out = Vec::new();
        if range.is_empty() {
            return out;
        }
        let mut idx = self.first_main_overlapping(range.start);
        while let Some(span) = self.main.get(idx) {
            if span.start >= range.end {
                break;
            }
            if span.overlaps(&range) {
                out.push(*span);
            }
            idx += 1;
        }
        if range.start < self.pending_end {
            out.extend(self.pending.iter().filter(|s| s.overlaps(&range)).copied());
        }
        out
    }

    /// The span containing `pos`: main store first (binary search), then the pending overlay.
    pub fn span_containing(&self, pos: usize) -> Option<Span> {
        let idx = self.main.partition_point(|s| s.start <= pos);
        if let Some(span) = idx.checked_sub(1).map(|i| self.main[i])
            && span.contains(pos)
        {
            return Some(span);
        }
        if pos >= self.pending_end {
            return None;
        }
        self.pending.iter().find(|s| s.contains(pos)).copied()
    }

    /// Where to resume scanning for a segment starting at `pos`, and in what state.
    ///
    /// The state is derived from the span containing `pos - 1`. This is an approximation: it only
    /// has to be a safe resumption point, since scanners re-derive delimiters from the text. Two
    /// contexts cannot be resumed in place and move the start back instead:
    ///
    /// - a heredoc opener or body on the previous line: its terminator is only known from the
    ///   opener, so the start moves to the opener's line;
    /// - a comment coalesced from line and block comments: the start moves to where the comment
    ///   begins, which is always plain code.
    pub fn resume_point(&self, shadow: &ShadowBuffer, pos: usize) -> (usize, ContinuationState) {
        let mut pos = pos;
        for _ in 0..MAX_BACKTRACK {
            if pos == 0 {
                return (0, ContinuationState::Neutral);
            }
            if let Some(back) = self.heredoc_backtrack(shadow, pos) {
                pos = back;
                continue;
            }
            let Some(span) = self.span_containing(pos - 1) else {
                return (pos, ContinuationState::Neutral);
            };
            let state = match (span.kind, span.marker) {
                (SpanKind::Comment, SpanMarker::BlockComment) => ContinuationState::BlockComment,
                (SpanKind::Comment, SpanMarker::Mixed) => {
                    return (span.start, ContinuationState::Neutral);
                }
                // Line comments end at the newline they include.
                (SpanKind::Comment, _) => ContinuationState::Neutral,
                (SpanKind::String, SpanMarker::Quote(q)) => {
                    ContinuationState::QuotedString { quote: Some(q) }
                }
                (SpanKind::String, _) => ContinuationState::QuotedString { quote: None },
                _ => ContinuationState::Neutral,
            };
            return (pos, state);
        }
        tracing::warn!(pos, "context backtracking limit reached");
        (pos, ContinuationState::QuotedString { quote: None })
    }

    /// Start of the line to rescan from when a heredoc-marked (or mixed) string span lies on the
    /// line before `pos` or earlier on its own line.
    ///
    /// A body span begins right after its opener's newline, so the opener line is the one before
    /// the body's first line.
    fn heredoc_backtrack(&self, shadow: &ShadowBuffer, pos: usize) -> Option<usize> {
        let line = shadow.line_of(pos);
        let window = shadow.line_start(line.saturating_sub(1))..pos;
        let first = self
            .overlapping(window)
            .into_iter()
            // A body coalesced with an adjacent string loses its marker to `Mixed`.
            .filter(|s| {
                s.kind == SpanKind::String
                    && matches!(s.marker, SpanMarker::Heredoc | SpanMarker::Mixed)
            })
            .map(|s| s.start)
            .min()?;
        let first_line = shadow.line_of(first);
        let target = if shadow.line_start(first_line) == first {
            first_line.saturating_sub(1)
        } else {
            first_line
        };
        let back = shadow.line_start(target);
        (back < pos).then_some(back)
    }

    /// Index of the first main span that may overlap a range starting at `pos`.
    fn first_main_overlapping(&self, pos: usize) -> usize {
        let mut idx = self.main.partition_point(|s| s.start < pos);
        while idx > 0 && self.main[idx - 1].end > pos {
            idx -= 1;
        }
        idx
    }
}

/// The parts of `span` outside `range`.
fn cut(span: &Span, range: &Range<usize>) -> impl Iterator<Item = Span> {
    let left = (span.start < range.start).then(|| Span {
        end: range.start,
        ..*span
    });
    let right = (span.end > range.end).then(|| Span {
        start: range.end,
        ..*span
    });
    left.into_iter().chain(right)
}

/// Translate one span through an edit. Returns `false` if the span collapsed.
fn shift_span(span: &mut Span, old: &Range<usize>, new_end: usize) -> bool {
    let map = |pos: usize, inside: usize| {
        if pos >= old.end {
            pos - old.end + new_end
        } else if pos <= old.start {
            pos
        } else {
            inside
        }
    };
    // An insertion exactly at a span's start pushes the whole span right.
    if span.start >= old.end {
        span.start = map(span.start, new_end);
        span.end = map(span.end, new_end);
        return true;
    }
    span.start = map(span.start, new_end);
    span.end = map(span.end, old.start);
    span.start < span.end
}

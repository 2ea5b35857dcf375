//! The incremental annotation engine.
//!
//! # Overview
//!
//! The engine owns the span store, the dirty-range set and (for line-state grammars) the
//! line-state cache. The host owns the text and its [`ShadowBuffer`], and drives the engine with
//! two kinds of calls that never overlap in time:
//!
//! - [`HighlightEngine::note_edit`] after every committed text mutation (the shadow buffer must
//!   already reflect it);
//! - [`HighlightEngine::ensure_up_to_date`] / [`HighlightEngine::attributes_in_range`] before
//!   rendering a viewport.
//!
//! Edits only shift offsets and mark whole lines dirty. Scanning is deferred until a range is
//! requested, and fresh results are staged into the pending overlay, which is merged into the
//! main store once it grows past the configured threshold.
//!
//! # Example
//!
//! ```rust
//! use editor_highlight::{ColorRole, HighlightConfig, HighlightEngine, ShadowBuffer};
//! use editor_highlight_lang::LanguageRegistry;
//!
//! let registry = LanguageRegistry::with_builtins();
//! let ruby = registry.by_name("ruby").unwrap();
//!
//! let mut shadow = ShadowBuffer::from_text("# hello\ndef foo\nend\n");
//! let mut engine = HighlightEngine::new(HighlightConfig::for_language(&ruby), &shadow);
//!
//! let attrs = engine.attributes_in_range(&shadow, 0..19, 4);
//! assert_eq!(attrs.len(), 3);
//! assert_eq!(attrs[2].role, ColorRole::Comment);
//!
//! // Host edit: replace "foo" with "bar", then notify the engine.
//! shadow.replace(12..15, "bar");
//! engine.note_edit(&shadow, 12..15, 3);
//! assert!(!engine.dirty_ranges().is_empty());
//! engine.ensure_up_to_date(&shadow, 0..shadow.len());
//! assert!(engine.dirty_ranges().is_empty());
//! ```

use crate::config::{HighlightConfig, StyleId};
use crate::dirty::DirtyRanges;
use crate::line_cache::LineStateCache;
use crate::resolver::{Attribute, resolve};
use crate::scanner::{RegionScanner, ScanMode, Scanner};
use crate::shadow::ShadowBuffer;
use crate::span::{Span, SpanKind, SpanMarker};
use crate::state::{ContinuationState, Resumption};
use crate::store::SpanStore;
use std::ops::Range;

/// What the most recent [`HighlightEngine::ensure_up_to_date`] (or `parse`) call scanned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Dirty segments (or stale line runs) processed.
    pub segments: usize,
    /// Lines handed to the scanner, counting repeats.
    pub lines: usize,
    /// Lowest scanned line.
    pub first_line: Option<usize>,
    /// Highest scanned line.
    pub last_line: Option<usize>,
    /// Spans staged into the pending overlay.
    pub spans_staged: usize,
}

impl ScanStats {
    fn record(&mut self, first_line: usize, last_line: usize) {
        self.lines += last_line + 1 - first_line;
        self.first_line = Some(self.first_line.map_or(first_line, |l| l.min(first_line)));
        self.last_line = Some(self.last_line.map_or(last_line, |l| l.max(last_line)));
    }
}

/// Incremental lexical annotation engine for one document.
#[derive(Debug, Clone)]
pub struct HighlightEngine {
    config: HighlightConfig,
    scanner: Scanner,
    store: SpanStore,
    dirty: DirtyRanges,
    /// Present for line-state grammars only.
    lines: Option<LineStateCache>,
    stats: ScanStats,
    /// Document length the engine's state is expressed against.
    doc_len: usize,
}

impl HighlightEngine {
    /// Create an engine for the document mirrored by `shadow`. The whole document starts dirty.
    pub fn new(config: HighlightConfig, shadow: &ShadowBuffer) -> Self {
        let scanner = Scanner::for_grammar(config.grammar);
        let mut engine = Self {
            config,
            scanner,
            store: SpanStore::new(),
            dirty: DirtyRanges::new(),
            lines: None,
            stats: ScanStats::default(),
            doc_len: 0,
        };
        engine.reset(shadow);
        engine
    }

    /// Active configuration.
    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }

    /// The scanner selected for the configured grammar.
    pub fn scanner(&self) -> Scanner {
        self.scanner
    }

    /// Ranges whose annotations are stale or absent.
    pub fn dirty_ranges(&self) -> &DirtyRanges {
        &self.dirty
    }

    /// Sorted, coalesced spans.
    pub fn main_spans(&self) -> &[Span] {
        self.store.main()
    }

    /// Spans staged since the last merge.
    pub fn pending_spans(&self) -> &[Span] {
        self.store.pending()
    }

    /// Per-line exit states (line-state grammars only).
    pub fn line_states(&self) -> Option<&LineStateCache> {
        self.lines.as_ref()
    }

    /// Statistics of the most recent scan pass.
    pub fn last_scan_stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Swap the configuration. All cached annotations are discarded and the whole document
    /// becomes dirty.
    pub fn reconfigure(&mut self, config: HighlightConfig, shadow: &ShadowBuffer) {
        tracing::debug!(grammar = %config.grammar, "reconfiguring highlight engine");
        self.scanner = Scanner::for_grammar(config.grammar);
        self.config = config;
        self.reset(shadow);
    }

    /// Forget everything and mark the whole document dirty.
    fn reset(&mut self, shadow: &ShadowBuffer) {
        self.store.clear();
        self.dirty.clear();
        if !shadow.is_empty() {
            self.dirty.insert(0..shadow.len());
        }
        self.lines = match self.scanner.mode() {
            ScanMode::Region => None,
            ScanMode::LineState => Some(LineStateCache::new(shadow.line_count())),
        };
        self.doc_len = shadow.len();
    }

    /// Record an edit that replaced `old` (pre-edit coordinates) with `new_len` characters.
    ///
    /// `shadow` must already reflect the edit. Spans after the edit shift by the length delta,
    /// the edited lines become dirty, and pending spans at or after the edited lines are dropped
    /// with everything from there on marked dirty.
    pub fn note_edit(&mut self, shadow: &ShadowBuffer, old: Range<usize>, new_len: usize) {
        let valid = old.start <= old.end
            && old.end <= self.doc_len
            && shadow.len() == self.doc_len - old.len() + new_len;
        debug_assert!(
            valid,
            "edit {old:?} -> {new_len} does not match document length {} -> {}",
            self.doc_len,
            shadow.len()
        );
        if !valid {
            tracing::warn!(
                ?old,
                new_len,
                doc_len = self.doc_len,
                shadow_len = shadow.len(),
                "inconsistent edit notification; discarding highlight state"
            );
            self.reset(shadow);
            return;
        }

        if shadow.is_empty() {
            self.store.clear();
            self.dirty.clear();
            if let Some(lines) = &mut self.lines {
                lines.reset(shadow.line_count());
            }
            self.doc_len = 0;
            return;
        }

        self.dirty.apply_edit(old.clone(), new_len);
        self.store.shift(old.clone(), new_len);

        let new_end = old.start + new_len;
        let region = shadow.expand_to_full_lines(old.start..new_end);
        self.dirty.insert(region.clone());
        if self.store.drop_pending_from(region.start) {
            self.dirty.insert(region.start..shadow.len());
        }

        if let Some(lines) = &mut self.lines {
            let first = shadow.line_of(old.start);
            let new_last = shadow.line_of(new_end);
            let old_last = (new_last + lines.len()).checked_sub(shadow.line_count());
            if !old_last.is_some_and(|old_last| lines.splice(first, old_last, new_last)) {
                tracing::warn!(
                    first,
                    new_last,
                    cached = lines.len(),
                    "line-state cache out of sync; resetting"
                );
                lines.reset(shadow.line_count());
            }
        }

        self.doc_len = shadow.len();
    }

    /// Bring annotations for `range` (expanded to whole lines) up to date.
    ///
    /// Idempotent: a second call without an intervening edit does nothing.
    pub fn ensure_up_to_date(&mut self, shadow: &ShadowBuffer, range: Range<usize>) {
        self.stats = ScanStats::default();
        if !self.check_length(shadow) {
            self.reset(shadow);
        }
        let range = shadow.clamp_range(range);
        if shadow.is_empty() {
            return;
        }

        let expanded = shadow.expand_to_full_lines(range);
        if expanded.is_empty() {
            return;
        }
        match self.scanner.mode() {
            ScanMode::Region => self.ensure_region(shadow, expanded),
            ScanMode::LineState => self.ensure_lines(shadow, expanded),
        }

        if self.store.pending().len() >= self.config.merge_threshold {
            self.merge_pending();
        }
    }

    /// Resolved attributes over `range`, scanning first if needed.
    pub fn attributes_in_range(
        &mut self,
        shadow: &ShadowBuffer,
        range: Range<usize>,
        tab_width: usize,
    ) -> Vec<Attribute> {
        let range = shadow.clamp_range(range);
        self.ensure_up_to_date(shadow, range.clone());
        if range.is_empty() {
            return Vec::new();
        }
        let spans = self.store.overlapping(range.clone());
        resolve(spans, range, shadow, tab_width)
    }

    /// Attributes over `range` mapped through the theme; unpainted roles are skipped.
    pub fn paint_in_range(
        &mut self,
        shadow: &ShadowBuffer,
        range: Range<usize>,
        tab_width: usize,
    ) -> Vec<(Range<usize>, StyleId)> {
        self.attributes_in_range(shadow, range, tab_width)
            .into_iter()
            .filter_map(|attr| {
                let style = self.config.theme.style_for(attr.role)?;
                Some((attr.range, style))
            })
            .collect()
    }

    /// Rescan `range` (expanded to whole lines) from a neutral state, discarding every
    /// incremental result for it, then merge the pending overlay.
    pub fn parse(&mut self, shadow: &ShadowBuffer, range: Range<usize>) {
        self.stats = ScanStats::default();
        if !self.check_length(shadow) {
            self.reset(shadow);
        }
        let range = shadow.clamp_range(range);
        if shadow.is_empty() {
            return;
        }

        let expanded = shadow.expand_to_full_lines(range);
        if expanded.is_empty() {
            return;
        }
        tracing::debug!(start = expanded.start, end = expanded.end, "full reparse");
        let len = shadow.len();
        let first_line = shadow.line_of(expanded.start);
        let last_line = shadow.line_of(expanded.end - 1);

        match self.scanner.mode() {
            ScanMode::Region => {
                let old_context = self.context_at(expanded.end, len);
                self.store.clear_range(expanded.clone());
                self.dirty.remove(expanded.clone());
                let out = self.scanner.scan(
                    &self.config.lexicon,
                    shadow.bytes_in_range(expanded.clone()),
                    expanded.start,
                    &ContinuationState::Neutral,
                );
                self.stats.segments = 1;
                self.stats.record(first_line, last_line);
                self.stats.spans_staged += self.store.stage(out.spans);
                if expanded.end < len && !settled(old_context.as_ref(), &out.exit) {
                    self.dirty.insert(shadow.line_range(expanded.end));
                }
            }
            ScanMode::LineState => {
                let Self {
                    config,
                    scanner,
                    store,
                    dirty,
                    lines,
                    stats,
                    ..
                } = self;
                let Some(lines) = lines.as_mut() else {
                    return;
                };
                let mut state = ContinuationState::Neutral;
                let mut prior = None;
                stats.segments = 1;
                for line in first_line..=last_line {
                    let range = shadow.line_range_at(line);
                    store.clear_range(range.clone());
                    dirty.remove(range.clone());
                    let out = scanner.scan(
                        &config.lexicon,
                        shadow.bytes_in_range(range.clone()),
                        range.start,
                        &state,
                    );
                    stats.spans_staged += store.stage(out.spans);
                    prior = lines.replace(line, out.exit.clone());
                    state = out.exit;
                }
                stats.record(first_line, last_line);
                if expanded.end < len && prior.as_ref() != Some(&state) {
                    dirty.insert(shadow.line_range_at(last_line + 1));
                }
            }
        }

        self.merge_pending();
    }

    /// Fold the pending overlay into the main store now.
    pub fn merge_pending(&mut self) {
        let merged = self.store.merge_pending();
        if merged > 0 {
            tracing::debug!(merged, main = self.store.main().len(), "merged pending spans");
        }
    }

    fn check_length(&self, shadow: &ShadowBuffer) -> bool {
        if shadow.len() == self.doc_len {
            return true;
        }
        tracing::warn!(
            expected = self.doc_len,
            actual = shadow.len(),
            "shadow buffer changed without an edit notification; discarding highlight state"
        );
        false
    }

    /// The stored span covering the character before `pos`, if `pos` is inside the document.
    ///
    /// A heredoc body starting at `pos` takes precedence: the line before it may end in plain
    /// code or a line comment, yet the text after `pos` is still string content.
    fn context_at(&self, pos: usize, len: usize) -> Option<Span> {
        if pos == 0 || pos >= len {
            return None;
        }
        self.store
            .span_containing(pos)
            .filter(|s| {
                s.start == pos
                    && s.kind == SpanKind::String
                    && matches!(s.marker, SpanMarker::Heredoc | SpanMarker::Mixed)
            })
            .or_else(|| self.store.span_containing(pos - 1))
    }

    fn ensure_region(&mut self, shadow: &ShadowBuffer, expanded: Range<usize>) {
        let segments = self.dirty.take_intersecting(expanded);
        let mut scanned_until = 0;
        for segment in segments {
            let segment = shadow.expand_to_full_lines(segment);
            let start = segment.start.max(scanned_until);
            if start >= segment.end {
                continue;
            }
            scanned_until = self.scan_segment(shadow, start..segment.end);
        }
    }

    /// Scan one dirty segment, then keep going line by line while the exit state disagrees with
    /// what the old annotations imply. Returns the end of the scanned text.
    fn scan_segment(&mut self, shadow: &ShadowBuffer, segment: Range<usize>) -> usize {
        let len = shadow.len();
        let (mut start, mut state) = self.store.resume_point(shadow, segment.start);
        let mut end = segment.end;
        self.stats.segments += 1;

        loop {
            let old_context = self.context_at(end, len);
            self.store.clear_range(start..end);
            self.dirty.remove(start..end);

            let out = self.scanner.scan(
                &self.config.lexicon,
                shadow.bytes_in_range(start..end),
                start,
                &state,
            );
            tracing::trace!(start, end, exit = ?out.exit, "scanned segment");
            self.stats.record(shadow.line_of(start), shadow.line_of(end - 1));
            self.stats.spans_staged += self.store.stage(out.spans);
            state = out.exit;

            if end >= len || settled(old_context.as_ref(), &state) {
                return end;
            }
            start = end;
            end = shadow.line_range(end).end;
        }
    }

    fn ensure_lines(&mut self, shadow: &ShadowBuffer, expanded: Range<usize>) {
        let Self {
            config,
            scanner,
            store,
            dirty,
            lines,
            stats,
            ..
        } = self;
        let Some(lines) = lines.as_mut() else {
            return;
        };
        if lines.len() != shadow.line_count() {
            tracing::warn!(
                cached = lines.len(),
                actual = shadow.line_count(),
                "line-state cache out of sync; resetting"
            );
            lines.reset(shadow.line_count());
        }

        let line_count = shadow.line_count();
        let last_viewport_line = shadow.line_of(expanded.end - 1);

        loop {
            let first_unknown = lines.first_unknown();
            let first_dirty = dirty.first().map(|r| shadow.line_of(r.start));
            let first = match (first_unknown, first_dirty) {
                (Some(a), Some(b)) => a.min(b),
                (a, b) => match a.or(b) {
                    Some(line) => line,
                    None => break,
                },
            };
            if first > last_viewport_line {
                break;
            }

            stats.segments += 1;
            let mut line = first;
            let mut state = lines.entry_state(line);
            loop {
                let range = shadow.line_range_at(line);
                store.clear_range(range.clone());
                dirty.remove(range.clone());
                let out = scanner.scan(
                    &config.lexicon,
                    shadow.bytes_in_range(range.clone()),
                    range.start,
                    &state,
                );
                stats.spans_staged += store.stage(out.spans);
                stats.record(line, line);
                let prior = lines.replace(line, out.exit.clone());
                state = out.exit;
                let converged = prior.as_ref() == Some(&state);

                line += 1;
                if line >= line_count {
                    break;
                }
                let next_clean =
                    lines.get(line).is_some() && !dirty.intersects(shadow.line_range_at(line));
                if next_clean && converged {
                    break;
                }
                if !next_clean && line > last_viewport_line {
                    break;
                }
            }
            tracing::trace!(first, last = line - 1, "rescanned lines");
        }
    }
}

/// Whether a scanner exit state agrees with the old annotation covering the same boundary, so
/// that the text after it needs no rescan.
fn settled(old: Option<&Span>, exit: &ContinuationState) -> bool {
    let Some(span) = old else {
        return exit.is_neutral();
    };
    match (exit.resumption(), span.kind) {
        // An open interpolation looks like code but never matches a stored span.
        _ if !exit.is_neutral() && exit.resumption() == Resumption::Neutral => false,
        (Resumption::Neutral, SpanKind::Comment) => span.marker == SpanMarker::LineComment,
        (Resumption::Neutral, SpanKind::String) => false,
        (Resumption::Neutral, _) => true,
        (Resumption::Comment, SpanKind::Comment) => {
            *exit == ContinuationState::BlockComment && span.marker == SpanMarker::BlockComment
        }
        (Resumption::String, SpanKind::String) => matches!(
            (exit, span.marker),
            (ContinuationState::QuotedString { quote: Some(q) }, SpanMarker::Quote(m)) if *q == m
        ),
        _ => false,
    }
}

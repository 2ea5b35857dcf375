//! Shadow buffer: a one-byte-per-character mirror of the document.
//!
//! Every document character maps to exactly one byte: ASCII characters are copied, anything else
//! collapses to [`PLACEHOLDER`]. Offsets into the shadow are therefore document character
//! offsets, and scanners can run over plain `&[u8]` with `memchr`.

use memchr::memchr_iter;
use ropey::Rope;
use std::ops::Range;

/// Byte used in place of every non-ASCII character.
///
/// It is never a delimiter in any grammar, and [`IdentChars`](crate::config::IdentChars) treats it
/// as an identifier byte so that `café` stays one word.
pub const PLACEHOLDER: u8 = 0x7F;

/// Map a document character to its shadow byte.
#[inline]
pub fn shadow_byte(ch: char) -> u8 {
    if ch.is_ascii() { ch as u8 } else { PLACEHOLDER }
}

/// A byte-addressable mirror of the document text.
///
/// Owned by the document layer; the annotation engine only ever reads it. A line-start table is
/// maintained alongside the bytes so that line lookups are `O(log n)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShadowBuffer {
    bytes: Vec<u8>,
    /// `line_starts[0] == 0`; every other entry is the offset just past a `\n`.
    line_starts: Vec<usize>,
}

impl ShadowBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            line_starts: vec![0],
        }
    }

    /// Build the shadow of `text`.
    pub fn from_text(text: &str) -> Self {
        let bytes: Vec<u8> = if text.is_ascii() {
            text.as_bytes().to_vec()
        } else {
            text.chars().map(shadow_byte).collect()
        };
        Self::from_shadow_bytes(bytes)
    }

    /// Build the shadow of a rope.
    pub fn from_rope(rope: &Rope) -> Self {
        let mut bytes = Vec::with_capacity(rope.len_chars());
        for chunk in rope.chunks() {
            if chunk.is_ascii() {
                bytes.extend_from_slice(chunk.as_bytes());
            } else {
                bytes.extend(chunk.chars().map(shadow_byte));
            }
        }
        Self::from_shadow_bytes(bytes)
    }

    fn from_shadow_bytes(bytes: Vec<u8>) -> Self {
        let mut line_starts = Vec::with_capacity(bytes.len() / 32 + 1);
        line_starts.push(0);
        line_starts.extend(memchr_iter(b'\n', &bytes).map(|i| i + 1));
        Self { bytes, line_starts }
    }

    /// Replace the characters in `range` with `text`.
    ///
    /// This is the host-side half of an edit: it must happen together with the document edit,
    /// before the engine is notified.
    pub fn replace(&mut self, range: Range<usize>, text: &str) {
        let range = self.clamp_range(range);
        let inserted: Vec<u8> = text.chars().map(shadow_byte).collect();
        let delta = inserted.len() as isize - range.len() as isize;

        // Line starts strictly inside the replaced text (just past a removed '\n').
        let first_removed = self.line_starts.partition_point(|&s| s <= range.start);
        let last_removed = self.line_starts.partition_point(|&s| s <= range.end);

        let new_starts = memchr_iter(b'\n', &inserted).map(|i| range.start + i + 1);
        self.line_starts
            .splice(first_removed..last_removed, new_starts);

        let shifted_from = first_removed + memchr_iter(b'\n', &inserted).count();
        for start in &mut self.line_starts[shifted_from..] {
            *start = (*start as isize + delta) as usize;
        }

        self.bytes.splice(range, inserted);
    }

    /// All shadow bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Document character count.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the document is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes in `range` (clamped).
    pub fn bytes_in_range(&self, range: Range<usize>) -> &[u8] {
        let range = self.clamp_range(range);
        &self.bytes[range]
    }

    /// Number of lines. An empty document, or one ending in `\n`, has a final empty line.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Line containing `offset` (`offset == len()` belongs to the last line).
    pub fn line_of(&self, offset: usize) -> usize {
        let offset = offset.min(self.len());
        self.line_starts
            .partition_point(|&s| s <= offset)
            .saturating_sub(1)
    }

    /// Start offset of `line` (clamped to the last line).
    pub fn line_start(&self, line: usize) -> usize {
        let line = line.min(self.line_count() - 1);
        self.line_starts[line]
    }

    /// Range of `line`, including its trailing `\n` if any.
    pub fn line_range_at(&self, line: usize) -> Range<usize> {
        let line = line.min(self.line_count() - 1);
        let start = self.line_starts[line];
        let end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.len());
        start..end
    }

    /// Range of the line containing `offset`, including its trailing `\n`.
    pub fn line_range(&self, offset: usize) -> Range<usize> {
        self.line_range_at(self.line_of(offset))
    }

    /// Expand `range` outward to whole lines (trailing `\n` included).
    ///
    /// An empty range expands to the line containing it.
    pub fn expand_to_full_lines(&self, range: Range<usize>) -> Range<usize> {
        let range = self.clamp_range(range);
        let start = self.line_range(range.start).start;
        let end = if range.is_empty() {
            self.line_range(range.start).end
        } else {
            self.line_range(range.end - 1).end
        };
        start..end
    }

    /// Clamp a range to the buffer.
    ///
    /// An out-of-range request is a programmer error: it trips a debug assertion, and in release
    /// builds it is logged and clamped.
    pub fn clamp_range(&self, range: Range<usize>) -> Range<usize> {
        let len = self.len();
        let valid = range.start <= range.end && range.end <= len;
        debug_assert!(
            valid,
            "range {range:?} out of bounds for shadow buffer of length {len}"
        );
        if valid {
            return range;
        }
        tracing::warn!(?range, len, "clamping out-of-range shadow buffer request");
        let end = range.end.min(len);
        range.start.min(end)..end
    }

    /// Display column of `offset` within its line, expanding tabs to `tab_width`.
    pub fn display_column(&self, offset: usize, tab_width: usize) -> usize {
        let offset = offset.min(self.len());
        let tab_width = tab_width.max(1);
        let line_start = self.line_range(offset).start;
        self.bytes[line_start..offset]
            .iter()
            .fold(0, |col, &b| match b {
                b'\t' => (col / tab_width + 1) * tab_width,
                _ => col + 1,
            })
    }
}

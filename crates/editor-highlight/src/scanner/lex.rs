//! Byte-level helpers shared by the scanners.

use crate::config::Lexicon;
use crate::span::{Span, SpanKind, SpanMarker};
use memchr::{memchr, memchr2, memchr3};

/// Collects spans in slice coordinates and emits them in document coordinates.
pub(super) struct SpanSink {
    spans: Vec<Span>,
    base: usize,
}

impl SpanSink {
    pub(super) fn new(base: usize) -> Self {
        Self {
            spans: Vec::new(),
            base,
        }
    }

    #[inline]
    pub(super) fn push(&mut self, start: usize, end: usize, kind: SpanKind) {
        self.push_marked(start, end, kind, SpanMarker::None);
    }

    pub(super) fn push_marked(
        &mut self,
        start: usize,
        end: usize,
        kind: SpanKind,
        marker: SpanMarker,
    ) {
        if start >= end {
            return;
        }
        debug_assert!(
            self.spans.last().is_none_or(|s| s.end <= self.base + start),
            "scanner emitted overlapping spans"
        );
        self.spans.push(Span {
            start: self.base + start,
            end: self.base + end,
            kind,
            marker,
        });
    }

    pub(super) fn finish(self) -> Vec<Span> {
        self.spans
    }
}

/// Where a delimited body ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Body {
    /// Closed; the index is one past the closing delimiter.
    Closed(usize),
    /// Hit an unescaped newline (only when newlines end the body); the index is the newline's.
    Newline(usize),
    /// Ran off the end of the slice.
    Open,
}

/// Scan a quoted body starting at `i` (just past the opening delimiter).
///
/// `close == None` closes on the first unescaped `"`, `'` or `` ` ``. A backslash escapes the next
/// byte, including a newline.
pub(super) fn quoted_body(bytes: &[u8], mut i: usize, close: Option<u8>, newline_ends: bool) -> Body {
    loop {
        let rest = bytes.get(i..).unwrap_or_default();
        let hit = match close {
            Some(q) if newline_ends => memchr3(q, b'\\', b'\n', rest),
            Some(q) => memchr2(q, b'\\', rest),
            None => rest.iter().position(|&b| {
                matches!(b, b'"' | b'\'' | b'`' | b'\\') || (newline_ends && b == b'\n')
            }),
        };
        let Some(off) = hit else {
            return Body::Open;
        };
        let j = i + off;
        match bytes[j] {
            b'\\' => {
                if j + 1 >= bytes.len() {
                    return Body::Open;
                }
                i = j + 2;
            }
            b'\n' if newline_ends => return Body::Newline(j),
            _ => return Body::Closed(j + 1),
        }
    }
}

/// Scan a regex body starting at `i` (just past the opening `/`). `/` inside a `[...]` class
/// does not close the literal.
pub(super) fn regex_body(bytes: &[u8], mut i: usize, newline_ends: bool) -> Body {
    let mut in_class = false;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                if i + 1 >= bytes.len() {
                    return Body::Open;
                }
                i += 2;
                continue;
            }
            b'[' => in_class = true,
            b']' => in_class = false,
            b'/' if !in_class => return Body::Closed(i + 1),
            b'\n' if newline_ends => return Body::Newline(i),
            _ => {}
        }
        i += 1;
    }
    Body::Open
}

/// Skip regex flags (`/x/gi`).
pub(super) fn regex_flags(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }
    i
}

/// Whether a `/` at `i` starts a regex literal rather than a division.
///
/// Decided by the nearest non-whitespace byte before `i` on the same line: nothing, an operator
/// or an opener means a literal follows; an identifier, a closer or a literal means division,
/// unless the identifier is a keyword (`return /x/`).
pub(super) fn regex_allowed(bytes: &[u8], i: usize, lexicon: &Lexicon) -> bool {
    let mut j = i;
    while j > 0 {
        let b = bytes[j - 1];
        match b {
            b' ' | b'\t' | b'\r' => j -= 1,
            b'\n' => return true,
            b')' | b']' | b'}' | b'"' | b'\'' | b'`' => return false,
            _ if lexicon.ident.contains(b) => {
                let mut start = j;
                while start > 0 && lexicon.ident.contains(bytes[start - 1]) {
                    start -= 1;
                }
                return lexicon.keywords.contains(&bytes[start..j]);
            }
            _ => return true,
        }
    }
    true
}

/// End of the identifier starting at `i`.
#[inline]
pub(super) fn scan_word(bytes: &[u8], mut i: usize, lexicon: &Lexicon) -> usize {
    while i < bytes.len() && lexicon.ident.contains(bytes[i]) {
        i += 1;
    }
    i
}

/// Whether the word at `start` is a method/property access (`x.end`) rather than a bare word.
#[inline]
pub(super) fn after_member_dot(bytes: &[u8], start: usize) -> bool {
    start > 0 && bytes[start - 1] == b'.' && !(start > 1 && bytes[start - 2] == b'.')
}

/// End of the numeric literal starting at `i` (an ASCII digit).
///
/// Accepts `0x`/`0o`/`0b` prefixes, `_` separators, a fraction and an exponent.
pub(super) fn scan_number(bytes: &[u8], i: usize) -> usize {
    let at = |k: usize| bytes.get(k).copied().unwrap_or(0);
    let digits = |mut k: usize, pred: fn(u8) -> bool| {
        while k < bytes.len() && (pred(bytes[k]) || bytes[k] == b'_') {
            k += 1;
        }
        k
    };

    if at(i) == b'0' && matches!(at(i + 1) | 0x20, b'x' | b'o' | b'b') && at(i + 2).is_ascii_hexdigit() {
        return digits(i + 2, |b| b.is_ascii_hexdigit());
    }

    let mut j = digits(i, |b| b.is_ascii_digit());
    if at(j) == b'.' && at(j + 1).is_ascii_digit() {
        j = digits(j + 1, |b| b.is_ascii_digit());
    }
    if matches!(at(j), b'e' | b'E') {
        let exp = if matches!(at(j + 1), b'+' | b'-') { j + 2 } else { j + 1 };
        if at(exp).is_ascii_digit() {
            j = digits(exp, |b| b.is_ascii_digit());
        }
    }
    j
}

/// Index of the next `\n` at or after `i`, or the slice length.
#[inline]
pub(super) fn line_end(bytes: &[u8], i: usize) -> usize {
    memchr(b'\n', bytes.get(i..).unwrap_or_default()).map_or(bytes.len(), |off| i + off)
}

/// Index just past the next `\n` at or after `i`, or the slice length.
#[inline]
pub(super) fn next_line(bytes: &[u8], i: usize) -> usize {
    (line_end(bytes, i) + 1).min(bytes.len())
}

/// Whether `i` is at the start of a line.
#[inline]
pub(super) fn at_line_start(bytes: &[u8], i: usize) -> bool {
    i == 0 || bytes[i - 1] == b'\n'
}

/// Skip spaces and tabs.
#[inline]
pub(super) fn skip_blanks(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && matches!(bytes[i], b' ' | b'\t') {
        i += 1;
    }
    i
}

/// Strip trailing spaces, tabs and carriage returns from `start..end`.
#[inline]
pub(super) fn trim_end(bytes: &[u8], start: usize, mut end: usize) -> usize {
    while end > start && matches!(bytes[end - 1], b' ' | b'\t' | b'\r') {
        end -= 1;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> Lexicon {
        Lexicon::new(["return", "typeof"], "$")
    }

    #[test]
    fn test_quoted_body_escapes() {
        assert_eq!(quoted_body(br#""a\"b" x"#, 1, Some(b'"'), true), Body::Closed(6));
        assert_eq!(quoted_body(b"'ab\ncd", 1, Some(b'\''), true), Body::Newline(3));
        assert_eq!(quoted_body(b"'ab\\\ncd'", 1, Some(b'\''), true), Body::Closed(8));
        assert_eq!(quoted_body(b"\"ab\ncd", 1, Some(b'"'), false), Body::Open);
        assert_eq!(quoted_body(b"ab\\", 0, Some(b'"'), false), Body::Open);
        assert_eq!(quoted_body(b"ab`c", 0, None, false), Body::Closed(3));
    }

    #[test]
    fn test_regex_body_classes() {
        assert_eq!(regex_body(b"/a[/]b/g", 1, true), Body::Closed(7));
        assert_eq!(regex_flags(b"/a[/]b/gi;", 7), 9);
        assert_eq!(regex_body(b"/a\\/b/", 1, true), Body::Closed(6));
        assert_eq!(regex_body(b"/ab\n/", 1, true), Body::Newline(3));
    }

    #[test]
    fn test_regex_allowed_by_preceding_byte() {
        let lex = lexicon();
        assert!(regex_allowed(b"/x/", 0, &lex));
        assert!(regex_allowed(b"a = /x/", 4, &lex));
        assert!(regex_allowed(b"f(/x/)", 2, &lex));
        assert!(regex_allowed(b"return /x/", 7, &lex));
        assert!(regex_allowed(b"a\n  /x/", 4, &lex));
        assert!(!regex_allowed(b"a / b", 2, &lex));
        assert!(!regex_allowed(b"f(x) / 2", 5, &lex));
        assert!(!regex_allowed(b"10 / 2", 3, &lex));
    }

    #[test]
    fn test_scan_number_forms() {
        assert_eq!(scan_number(b"123 ", 0), 3);
        assert_eq!(scan_number(b"1_000.5e-3;", 0), 10);
        assert_eq!(scan_number(b"0xFF_ff", 0), 7);
        assert_eq!(scan_number(b"0b101", 0), 5);
        assert_eq!(scan_number(b"1..2", 0), 1);
        assert_eq!(scan_number(b"1.foo", 0), 1);
        assert_eq!(scan_number(b"2e", 0), 1);
    }

    #[test]
    fn test_line_helpers() {
        let bytes = b"ab\ncd";
        assert_eq!(line_end(bytes, 0), 2);
        assert_eq!(next_line(bytes, 0), 3);
        assert_eq!(next_line(bytes, 3), 5);
        assert!(at_line_start(bytes, 3));
        assert!(!at_line_start(bytes, 4));
        assert_eq!(trim_end(b"ab \t", 0, 4), 2);
        assert_eq!(skip_blanks(b"  \tx", 0), 3);
    }
}

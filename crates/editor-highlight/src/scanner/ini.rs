//! Key-value (INI) region scanner.
//!
//! ```text
//! ; comment            -> comment (newline included)
//! [section]            -> keyword
//! key = value ; note   -> identifier, punctuation, value, comment
//! ```
//!
//! Values are strings when quoted, numbers when numeric and keywords when the (ASCII
//! case-folded) value is in the keyword table. A quoted value left open continues on the next
//! line.

use super::lex::{
    Body, SpanSink, line_end, next_line, quoted_body, scan_number, skip_blanks, trim_end,
};
use super::{RegionScanner, ScanOutput};
use crate::config::Lexicon;
use crate::span::{SpanKind, SpanMarker};
use crate::state::ContinuationState;

/// Region-per-call scanner for INI-style configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyValueScanner;

impl RegionScanner for KeyValueScanner {
    fn scan(
        &self,
        lexicon: &Lexicon,
        bytes: &[u8],
        base: usize,
        initial: &ContinuationState,
    ) -> ScanOutput {
        let mut pass = KeyValuePass {
            lexicon,
            bytes,
            sink: SpanSink::new(base),
        };
        let exit = pass.run(initial);
        ScanOutput {
            spans: pass.sink.finish(),
            exit,
        }
    }
}

struct KeyValuePass<'a> {
    lexicon: &'a Lexicon,
    bytes: &'a [u8],
    sink: SpanSink,
}

impl KeyValuePass<'_> {
    fn run(&mut self, initial: &ContinuationState) -> ContinuationState {
        let mut pos = 0;
        if let ContinuationState::QuotedString { quote } = initial {
            match self.quoted_value(0, 0, *quote) {
                Ok(end) => pos = self.trailing(end),
                Err(open) => return open,
            }
        }

        while pos < self.bytes.len() {
            match self.line(pos) {
                Ok(next) => pos = next,
                Err(open) => return open,
            }
        }
        ContinuationState::Neutral
    }

    /// Scan one line. Returns the start of the next line, or the state left open.
    fn line(&mut self, start: usize) -> Result<usize, ContinuationState> {
        let bytes = self.bytes;
        let end = line_end(bytes, start);
        let next = next_line(bytes, start);
        let i = skip_blanks(bytes, start);
        if i >= end {
            return Ok(next);
        }

        match bytes[i] {
            b';' | b'#' => {
                self.sink
                    .push_marked(i, next, SpanKind::Comment, SpanMarker::LineComment);
                Ok(next)
            }
            b'[' => {
                let close = bytes[i..end].iter().position(|&b| b == b']');
                let header_end = match close {
                    Some(off) => i + off + 1,
                    None => trim_end(bytes, i, end),
                };
                self.sink.push(i, header_end, SpanKind::Keyword);
                Ok(self.trailing(header_end))
            }
            _ => self.key_value(i, end),
        }
    }

    fn key_value(&mut self, start: usize, end: usize) -> Result<usize, ContinuationState> {
        let bytes = self.bytes;
        let Some(sep) = bytes[start..end]
            .iter()
            .position(|&b| b == b'=' || b == b':')
            .map(|off| start + off)
        else {
            let key_end = self.comment_start(start, end).unwrap_or(end);
            self.sink
                .push(start, trim_end(bytes, start, key_end), SpanKind::Identifier);
            return Ok(self.trailing(key_end));
        };

        self.sink
            .push(start, trim_end(bytes, start, sep), SpanKind::Identifier);
        self.sink.push(sep, sep + 1, SpanKind::Punctuation);

        let value = skip_blanks(bytes, sep + 1);
        if value >= end {
            return Ok(next_line(bytes, end));
        }
        match bytes[value] {
            q @ (b'"' | b'\'') => {
                let after = self.quoted_value(value, value + 1, Some(q))?;
                Ok(self.trailing(after))
            }
            _ => {
                let comment = self.comment_start(value, end);
                let value_end = trim_end(bytes, value, comment.unwrap_or(end));
                self.bare_value(value, value_end);
                Ok(self.trailing(comment.unwrap_or(end)))
            }
        }
    }

    /// A quoted value; `Ok` holds the index past the closing quote.
    fn quoted_value(
        &mut self,
        start: usize,
        body: usize,
        quote: Option<u8>,
    ) -> Result<usize, ContinuationState> {
        let marker = quote.map_or(SpanMarker::None, SpanMarker::Quote);
        match quoted_body(self.bytes, body, quote, false) {
            Body::Closed(end) => {
                self.sink.push_marked(start, end, SpanKind::String, marker);
                Ok(end)
            }
            Body::Newline(_) | Body::Open => {
                self.sink
                    .push_marked(start, self.bytes.len(), SpanKind::String, marker);
                Err(ContinuationState::QuotedString { quote })
            }
        }
    }

    fn bare_value(&mut self, start: usize, end: usize) {
        let bytes = self.bytes;
        let value = &bytes[start..end];
        let digits_from = if matches!(value.first(), Some(b'-' | b'+')) {
            start + 1
        } else {
            start
        };
        if digits_from < end && bytes[digits_from].is_ascii_digit() && scan_number(bytes, digits_from) == end {
            self.sink.push(start, end, SpanKind::Number);
        } else if self
            .lexicon
            .keywords
            .contains(&value.to_ascii_lowercase())
        {
            self.sink.push(start, end, SpanKind::Keyword);
        }
    }

    /// Start of an inline comment (`;` or `#` after whitespace) in `from..end`.
    fn comment_start(&self, from: usize, end: usize) -> Option<usize> {
        let bytes = self.bytes;
        (from + 1..end).find(|&k| {
            matches!(bytes[k], b';' | b'#') && matches!(bytes[k - 1], b' ' | b'\t')
        })
    }

    /// Whatever follows a header or value on its line: only a comment is highlighted.
    /// Returns the start of the next line.
    fn trailing(&mut self, from: usize) -> usize {
        let bytes = self.bytes;
        let next = next_line(bytes, from);
        let i = skip_blanks(bytes, from);
        if i < bytes.len() && matches!(bytes[i], b';' | b'#') {
            self.sink
                .push_marked(i, next, SpanKind::Comment, SpanMarker::LineComment);
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lexicon() -> Lexicon {
        Lexicon::new(["true", "false", "on", "off"], "")
    }

    fn scan_from(text: &str, initial: &ContinuationState) -> ScanOutput {
        KeyValueScanner.scan(&lexicon(), text.as_bytes(), 0, initial)
    }

    fn kinds(out: &ScanOutput) -> Vec<(usize, usize, SpanKind)> {
        out.spans.iter().map(|s| (s.start, s.end, s.kind)).collect()
    }

    #[test]
    fn test_sections_keys_values() {
        let text = "; top\n[core]\nname = demo\nport: 8080\nfast = True ; yes\n";
        let out = scan_from(text, &ContinuationState::Neutral);
        assert_eq!(
            kinds(&out),
            vec![
                (0, 6, SpanKind::Comment),
                (6, 12, SpanKind::Keyword),
                (13, 17, SpanKind::Identifier),
                (18, 19, SpanKind::Punctuation),
                (25, 29, SpanKind::Identifier),
                (29, 30, SpanKind::Punctuation),
                (31, 35, SpanKind::Number),
                (36, 40, SpanKind::Identifier),
                (41, 42, SpanKind::Punctuation),
                (43, 47, SpanKind::Keyword),
                (48, 54, SpanKind::Comment),
            ]
        );
        assert_eq!(out.exit, ContinuationState::Neutral);
    }

    #[test]
    fn test_quoted_value_continues_across_lines() {
        let out = scan_from("k = \"a ; b\n", &ContinuationState::Neutral);
        assert_eq!(
            kinds(&out),
            vec![
                (0, 1, SpanKind::Identifier),
                (2, 3, SpanKind::Punctuation),
                (4, 11, SpanKind::String),
            ]
        );
        assert_eq!(
            out.exit,
            ContinuationState::QuotedString { quote: Some(b'"') }
        );

        let resumed = scan_from("c\" # done\nx=1\n", &out.exit);
        assert_eq!(
            kinds(&resumed),
            vec![
                (0, 2, SpanKind::String),
                (3, 10, SpanKind::Comment),
                (10, 11, SpanKind::Identifier),
                (11, 12, SpanKind::Punctuation),
                (12, 13, SpanKind::Number),
            ]
        );
        assert_eq!(resumed.exit, ContinuationState::Neutral);
    }

    #[test]
    fn test_value_with_hash_is_not_comment() {
        let out = scan_from("color=#fff\nurl = a;b\n", &ContinuationState::Neutral);
        assert_eq!(
            kinds(&out),
            vec![
                (0, 5, SpanKind::Identifier),
                (5, 6, SpanKind::Punctuation),
                (11, 14, SpanKind::Identifier),
                (15, 16, SpanKind::Punctuation),
            ]
        );
    }

    #[test]
    fn test_negative_numbers_and_bare_keys() {
        let out = scan_from("level = -3\nflag\n", &ContinuationState::Neutral);
        assert_eq!(
            kinds(&out),
            vec![
                (0, 5, SpanKind::Identifier),
                (6, 7, SpanKind::Punctuation),
                (8, 10, SpanKind::Number),
                (11, 15, SpanKind::Identifier),
            ]
        );
    }
}

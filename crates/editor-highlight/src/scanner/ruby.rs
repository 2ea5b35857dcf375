//! Ruby-family region scanner.
//!
//! Handles `#` line comments, `=begin`/`=end` block comments, `"`/`'`/`` ` `` strings (which may
//! span lines), regex literals, heredocs (`<<ID`, `<<-ID`, `<<~ID`, quoted identifiers), symbols,
//! sigil variables, numbers and keywords. Plain identifiers produce no span.
//!
//! Only the first heredoc opener of a line starts a body; later openers on the same line are
//! highlighted as strings but their bodies are not tracked.

use super::lex::{
    Body, SpanSink, after_member_dot, at_line_start, line_end, next_line, quoted_body,
    regex_allowed, regex_body, regex_flags, scan_number, scan_word,
};
use super::{RegionScanner, ScanOutput};
use crate::config::Lexicon;
use crate::span::{SpanKind, SpanMarker};
use crate::state::ContinuationState;

/// Region-per-call scanner for Ruby-like languages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RubyScanner;

impl RegionScanner for RubyScanner {
    fn scan(
        &self,
        lexicon: &Lexicon,
        bytes: &[u8],
        base: usize,
        initial: &ContinuationState,
    ) -> ScanOutput {
        let mut pass = RubyPass {
            lexicon,
            bytes,
            pos: 0,
            sink: SpanSink::new(base),
            pending_heredoc: None,
        };
        let exit = pass.run(initial);
        ScanOutput {
            spans: pass.sink.finish(),
            exit,
        }
    }
}

#[derive(Debug, Clone)]
struct Heredoc {
    terminator: Box<[u8]>,
    indented: bool,
    raw: bool,
}

impl Heredoc {
    fn into_state(self) -> ContinuationState {
        ContinuationState::Heredoc {
            terminator: self.terminator,
            indented: self.indented,
            raw: self.raw,
        }
    }
}

/// One scanner invocation. Every construct method returns `Some(state)` when the construct is
/// still open at the end of the slice, and `None` when it closed.
struct RubyPass<'a> {
    lexicon: &'a Lexicon,
    bytes: &'a [u8],
    pos: usize,
    sink: SpanSink,
    /// Heredoc whose body starts after the current line.
    pending_heredoc: Option<Heredoc>,
}

impl RubyPass<'_> {
    fn run(&mut self, initial: &ContinuationState) -> ContinuationState {
        let open = match initial {
            ContinuationState::Neutral
            | ContinuationState::TemplateText
            | ContinuationState::TemplateInterpolation { .. } => None,
            ContinuationState::LineComment => self.line_comment(0),
            ContinuationState::BlockComment => self.block_comment(0, 0),
            ContinuationState::QuotedString { quote: Some(b'/') } => self.regex(0, 0),
            ContinuationState::QuotedString { quote } => self.string(0, 0, *quote),
            ContinuationState::Heredoc {
                terminator,
                indented,
                raw,
            } => self.heredoc_body(Heredoc {
                terminator: terminator.clone(),
                indented: *indented,
                raw: *raw,
            }),
        };
        match open {
            Some(state) => state,
            None => self.code(),
        }
    }

    fn code(&mut self) -> ContinuationState {
        let (bytes, lexicon) = (self.bytes, self.lexicon);
        let ident = &lexicon.ident;

        while self.pos < bytes.len() {
            let i = self.pos;
            let b = bytes[i];
            let open = match b {
                b'\n' => {
                    self.pos += 1;
                    self.start_pending_heredoc()
                }
                b'#' => self.line_comment(i),
                b'=' if self.at_block_comment_marker(i, b"=begin") => {
                    self.block_comment(i, next_line(bytes, i))
                }
                b'"' | b'\'' | b'`' => self.string(i, 1, Some(b)),
                b'/' if regex_allowed(bytes, i, lexicon) => self.regex(i, 1),
                b'<' if bytes.get(i + 1) == Some(&b'<') => {
                    self.heredoc_opener(i);
                    None
                }
                b'@' | b'$' => {
                    self.variable(i);
                    None
                }
                b':' => self.symbol(i),
                b'0'..=b'9' if i == 0 || !ident.contains(bytes[i - 1]) => {
                    let end = scan_number(bytes, i);
                    self.sink.push(i, end, SpanKind::Number);
                    self.pos = end;
                    None
                }
                _ if ident.is_start(b) => {
                    self.word(i);
                    None
                }
                _ => {
                    self.pos += 1;
                    None
                }
            };
            if let Some(state) = open {
                return state;
            }
        }

        ContinuationState::Neutral
    }

    /// After a newline: the body of a heredoc opened on the finished line starts here.
    fn start_pending_heredoc(&mut self) -> Option<ContinuationState> {
        let heredoc = self.pending_heredoc.take()?;
        self.heredoc_body(heredoc)
    }

    fn at_block_comment_marker(&self, i: usize, marker: &[u8]) -> bool {
        at_line_start(self.bytes, i)
            && self.bytes[i..].starts_with(marker)
            && self
                .bytes
                .get(i + marker.len())
                .is_none_or(|b| b.is_ascii_whitespace())
    }

    fn line_comment(&mut self, start: usize) -> Option<ContinuationState> {
        let end = line_end(self.bytes, start);
        if end == self.bytes.len() {
            self.sink
                .push_marked(start, end, SpanKind::Comment, SpanMarker::LineComment);
            self.pos = end;
            return Some(ContinuationState::LineComment);
        }
        self.sink
            .push_marked(start, end + 1, SpanKind::Comment, SpanMarker::LineComment);
        self.pos = end + 1;
        self.start_pending_heredoc()
    }

    /// Block comment from `start`; closing `=end` lines are searched from `first_line` on.
    fn block_comment(&mut self, start: usize, first_line: usize) -> Option<ContinuationState> {
        let len = self.bytes.len();
        let mut line = first_line;
        while line < len {
            let next = next_line(self.bytes, line);
            if self.at_block_comment_marker(line, b"=end") {
                // The closing line's newline stays outside, so a span covering a newline is open.
                let end = line_end(self.bytes, line);
                self.sink
                    .push_marked(start, end, SpanKind::Comment, SpanMarker::BlockComment);
                self.pos = next;
                return None;
            }
            line = next;
        }
        self.sink
            .push_marked(start, len, SpanKind::Comment, SpanMarker::BlockComment);
        self.pos = len;
        Some(ContinuationState::BlockComment)
    }

    /// Quoted string starting at `start`, body after `open_len` delimiter bytes.
    fn string(
        &mut self,
        start: usize,
        open_len: usize,
        quote: Option<u8>,
    ) -> Option<ContinuationState> {
        let marker = quote.map_or(SpanMarker::None, SpanMarker::Quote);
        match quoted_body(self.bytes, start + open_len, quote, false) {
            Body::Closed(end) => {
                self.sink.push_marked(start, end, SpanKind::String, marker);
                self.pos = end;
                None
            }
            Body::Newline(_) | Body::Open => {
                let len = self.bytes.len();
                self.sink.push_marked(start, len, SpanKind::String, marker);
                self.pos = len;
                Some(ContinuationState::QuotedString { quote })
            }
        }
    }

    fn regex(&mut self, start: usize, open_len: usize) -> Option<ContinuationState> {
        let marker = SpanMarker::Quote(b'/');
        match regex_body(self.bytes, start + open_len, false) {
            Body::Closed(end) => {
                let end = regex_flags(self.bytes, end);
                self.sink.push_marked(start, end, SpanKind::String, marker);
                self.pos = end;
                None
            }
            Body::Newline(_) | Body::Open => {
                let len = self.bytes.len();
                self.sink.push_marked(start, len, SpanKind::String, marker);
                self.pos = len;
                Some(ContinuationState::QuotedString {
                    quote: Some(b'/'),
                })
            }
        }
    }

    /// `<<` at `i`: a heredoc opener if followed by an identifier, otherwise an operator.
    fn heredoc_opener(&mut self, i: usize) {
        let bytes = self.bytes;
        let mut j = i + 2;
        let indented = matches!(bytes.get(j), Some(b'-' | b'~'));
        if indented {
            j += 1;
        }

        let opener = match bytes.get(j) {
            Some(&q @ (b'\'' | b'"' | b'`')) => {
                let id_start = j + 1;
                let id_end = bytes[id_start..]
                    .iter()
                    .position(|&b| b == q || b == b'\n')
                    .map(|off| id_start + off);
                match id_end {
                    Some(k) if bytes[k] == q && k > id_start => Some((
                        k + 1,
                        Heredoc {
                            terminator: bytes[id_start..k].into(),
                            indented,
                            raw: q == b'\'',
                        },
                    )),
                    _ => None,
                }
            }
            Some(&c) if c.is_ascii_uppercase() || c == b'_' => {
                let mut k = j;
                while k < bytes.len() && (bytes[k].is_ascii_alphanumeric() || bytes[k] == b'_') {
                    k += 1;
                }
                Some((
                    k,
                    Heredoc {
                        terminator: bytes[j..k].into(),
                        indented,
                        raw: false,
                    },
                ))
            }
            _ => None,
        };

        match opener {
            Some((end, heredoc)) => {
                self.sink
                    .push_marked(i, end, SpanKind::String, SpanMarker::Heredoc);
                if self.pending_heredoc.is_none() {
                    self.pending_heredoc = Some(heredoc);
                }
                self.pos = end;
            }
            None => self.pos = i + 2,
        }
    }

    /// Heredoc body from the current position (a line start) through the terminator line.
    fn heredoc_body(&mut self, heredoc: Heredoc) -> Option<ContinuationState> {
        let bytes = self.bytes;
        let start = self.pos;
        let mut line = start;
        while line < bytes.len() {
            let next = next_line(bytes, line);
            let mut content = &bytes[line..line_end(bytes, line)];
            if let Some(stripped) = content.strip_suffix(b"\r") {
                content = stripped;
            }
            if heredoc.indented {
                let indent = content
                    .iter()
                    .take_while(|b| matches!(b, b' ' | b'\t'))
                    .count();
                content = &content[indent..];
            }
            if content == &*heredoc.terminator {
                self.sink
                    .push_marked(start, next, SpanKind::String, SpanMarker::Heredoc);
                self.pos = next;
                return None;
            }
            line = next;
        }
        self.sink
            .push_marked(start, bytes.len(), SpanKind::String, SpanMarker::Heredoc);
        self.pos = bytes.len();
        Some(heredoc.into_state())
    }

    /// `@ivar`, `@@cvar`, `$gvar`, `$!`.
    fn variable(&mut self, i: usize) {
        let (bytes, lexicon) = (self.bytes, self.lexicon);
        let ident = &lexicon.ident;
        let mut j = i + 1;
        if bytes[i] == b'@' && bytes.get(j) == Some(&b'@') {
            j += 1;
        }

        let end = match bytes.get(j) {
            Some(&c) if ident.is_start(c) => scan_word(bytes, j, lexicon),
            Some(&c) if bytes[i] == b'$' && c.is_ascii_graphic() => j + 1,
            _ => {
                self.pos = j;
                return;
            }
        };
        self.sink.push(i, end, SpanKind::Variable);
        self.pos = end;
    }

    /// `:name` and `:"quoted"` symbols; `::` and `a ? b : c` are punctuation.
    fn symbol(&mut self, i: usize) -> Option<ContinuationState> {
        let (bytes, lexicon) = (self.bytes, self.lexicon);
        let ident = &lexicon.ident;
        if bytes.get(i + 1) == Some(&b':') {
            self.pos = i + 2;
            return None;
        }
        if i > 0 && ident.contains(bytes[i - 1]) {
            self.pos = i + 1;
            return None;
        }
        match bytes.get(i + 1) {
            Some(&q @ (b'"' | b'\'')) => self.string(i, 2, Some(q)),
            Some(&c) if ident.is_start(c) => {
                let mut end = scan_word(bytes, i + 1, lexicon);
                if matches!(bytes.get(end), Some(b'?' | b'!')) {
                    end += 1;
                }
                self.sink.push(i, end, SpanKind::String);
                self.pos = end;
                None
            }
            _ => {
                self.pos = i + 1;
                None
            }
        }
    }

    fn word(&mut self, i: usize) {
        let (bytes, lexicon) = (self.bytes, self.lexicon);
        let keywords = &lexicon.keywords;
        let end = scan_word(bytes, i, lexicon);
        self.pos = end;
        if after_member_dot(bytes, i) {
            return;
        }

        // `defined?`, `block_given?`: a predicate suffix belongs to the word unless it starts `!=`.
        if matches!(bytes.get(end), Some(b'?' | b'!'))
            && bytes.get(end + 1) != Some(&b'=')
            && keywords.contains(&bytes[i..end + 1])
        {
            self.sink.push(i, end + 1, SpanKind::Keyword);
            self.pos = end + 1;
        } else if keywords.contains(&bytes[i..end]) {
            self.sink.push(i, end, SpanKind::Keyword);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;
    use pretty_assertions::assert_eq;

    fn lexicon() -> Lexicon {
        Lexicon::new(
            ["def", "end", "if", "return", "defined?", "class", "do", "nil"],
            "",
        )
    }

    fn scan_from(text: &str, initial: ContinuationState) -> ScanOutput {
        RubyScanner.scan(&lexicon(), text.as_bytes(), 0, &initial)
    }

    fn scan(text: &str) -> ScanOutput {
        scan_from(text, ContinuationState::Neutral)
    }

    fn kinds(out: &ScanOutput) -> Vec<(usize, usize, SpanKind)> {
        out.spans.iter().map(|s| (s.start, s.end, s.kind)).collect()
    }

    #[test]
    fn test_comment_and_keywords() {
        let out = scan("# hello\ndef foo\nend\n");
        assert_eq!(
            kinds(&out),
            vec![
                (0, 8, SpanKind::Comment),
                (8, 11, SpanKind::Keyword),
                (16, 19, SpanKind::Keyword),
            ]
        );
        assert_eq!(out.exit, ContinuationState::Neutral);
        assert_eq!(out.spans[0].marker, SpanMarker::LineComment);
    }

    #[test]
    fn test_base_offsets_spans() {
        let out = RubyScanner.scan(&lexicon(), b"end", 100, &ContinuationState::Neutral);
        assert_eq!(out.spans, vec![Span::new(100, 103, SpanKind::Keyword)]);
    }

    #[test]
    fn test_strings_and_keywords_inside() {
        let out = scan("x = \"if \\\" end\" + 'a'\n");
        assert_eq!(
            kinds(&out),
            vec![(4, 15, SpanKind::String), (18, 21, SpanKind::String)]
        );
        assert_eq!(out.spans[0].marker, SpanMarker::Quote(b'"'));
    }

    #[test]
    fn test_unterminated_string_is_dangling() {
        let out = scan("x = \"abc\ndef\n");
        assert_eq!(kinds(&out), vec![(4, 13, SpanKind::String)]);
        assert_eq!(
            out.exit,
            ContinuationState::QuotedString { quote: Some(b'"') }
        );

        let resumed = scan_from(
            "more\" if\n",
            ContinuationState::QuotedString { quote: Some(b'"') },
        );
        assert_eq!(
            kinds(&resumed),
            vec![(0, 5, SpanKind::String), (6, 8, SpanKind::Keyword)]
        );
        assert_eq!(resumed.exit, ContinuationState::Neutral);
    }

    #[test]
    fn test_unknown_quote_closes_on_any_quote() {
        let out = scan_from(
            "ab' end\n",
            ContinuationState::QuotedString { quote: None },
        );
        assert_eq!(
            kinds(&out),
            vec![(0, 3, SpanKind::String), (4, 7, SpanKind::Keyword)]
        );
    }

    #[test]
    fn test_block_comment() {
        let text = "=begin\ndef\n=end\nend\n";
        let out = scan(text);
        assert_eq!(
            kinds(&out),
            vec![(0, 15, SpanKind::Comment), (16, 19, SpanKind::Keyword)]
        );

        let open = scan("=begin\ndef\n");
        assert_eq!(open.exit, ContinuationState::BlockComment);

        let resumed = scan_from("=end\nend\n", ContinuationState::BlockComment);
        assert_eq!(
            kinds(&resumed),
            vec![(0, 4, SpanKind::Comment), (5, 8, SpanKind::Keyword)]
        );
        assert_eq!(resumed.exit, ContinuationState::Neutral);

        // `=beginning` is not a marker, and neither is an indented `=begin`.
        assert_eq!(scan("=beginning\n").exit, ContinuationState::Neutral);
        assert_eq!(scan(" =begin\n").exit, ContinuationState::Neutral);
    }

    #[test]
    fn test_heredoc() {
        let text = "x = <<~EOS # note\n  if\n  EOS\nend\n";
        let out = scan(text);
        assert_eq!(
            kinds(&out),
            vec![
                (4, 10, SpanKind::String),
                (11, 18, SpanKind::Comment),
                (18, 29, SpanKind::String),
                (29, 32, SpanKind::Keyword),
            ]
        );
        assert_eq!(out.spans[2].marker, SpanMarker::Heredoc);
        assert_eq!(out.exit, ContinuationState::Neutral);
    }

    #[test]
    fn test_heredoc_open_at_end() {
        let out = scan("x = <<'RAW'\nbody\n");
        assert_eq!(
            out.exit,
            ContinuationState::Heredoc {
                terminator: b"RAW".to_vec().into_boxed_slice(),
                indented: false,
                raw: true,
            }
        );

        // Plain heredocs need the terminator at column 0.
        let out = scan("x = <<EOS\n  EOS\nEOS\n");
        assert_eq!(kinds(&out), vec![(4, 9, SpanKind::String), (10, 20, SpanKind::String)]);
        assert_eq!(out.exit, ContinuationState::Neutral);
    }

    #[test]
    fn test_shift_operator_is_not_heredoc() {
        let out = scan("a << b\nend\n");
        assert_eq!(kinds(&out), vec![(7, 10, SpanKind::Keyword)]);
    }

    #[test]
    fn test_variables_symbols_numbers() {
        let out = scan("@a = @@b + $stdout + $! + :sym + A::B ? 1 : 0x1F\n");
        assert_eq!(
            kinds(&out),
            vec![
                (0, 2, SpanKind::Variable),
                (5, 8, SpanKind::Variable),
                (11, 18, SpanKind::Variable),
                (21, 23, SpanKind::Variable),
                (26, 30, SpanKind::String),
                (40, 41, SpanKind::Number),
                (44, 48, SpanKind::Number),
            ]
        );
    }

    #[test]
    fn test_regex_vs_division() {
        let out = scan("a = b / c / d\nif x =~ /en d/i\n");
        assert_eq!(
            kinds(&out),
            vec![(14, 16, SpanKind::Keyword), (22, 29, SpanKind::String)]
        );
    }

    #[test]
    fn test_predicate_keyword_and_member_access() {
        let out = scan("defined?(x) x.end x!=nil\n");
        assert_eq!(
            kinds(&out),
            vec![(0, 8, SpanKind::Keyword), (21, 24, SpanKind::Keyword)]
        );
    }
}

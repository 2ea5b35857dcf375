//! C-family scanner with template literals, driven one line at a time.
//!
//! Template literals nest: an interpolation `${ ... }` holds code, which may open another
//! template. Each open interpolation keeps its own brace depth so that object literals and
//! blocks inside it do not close it early.

use super::lex::{
    Body, SpanSink, after_member_dot, line_end, quoted_body, regex_allowed, regex_body,
    regex_flags, scan_number, scan_word,
};
use super::{RegionScanner, ScanOutput};
use crate::config::Lexicon;
use crate::span::{SpanKind, SpanMarker};
use crate::state::ContinuationState;
use memchr::{memchr3, memmem};

/// Line-state scanner for JavaScript-like languages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemplateScanner;

impl RegionScanner for TemplateScanner {
    fn scan(
        &self,
        lexicon: &Lexicon,
        bytes: &[u8],
        base: usize,
        initial: &ContinuationState,
    ) -> ScanOutput {
        let (frames, mode) = unpack(initial);
        let mut pass = TemplatePass {
            lexicon,
            bytes,
            pos: 0,
            sink: SpanSink::new(base),
            frames,
            mode,
            text_start: 0,
        };
        pass.run();
        let exit = pass.exit_state();
        ScanOutput {
            spans: pass.sink.finish(),
            exit,
        }
    }
}

/// Innermost lexical mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Code,
    LineComment,
    BlockComment,
    /// Quoted string; `None` closes on any quote.
    Str(Option<u8>),
    /// Template-literal text.
    Template,
}

/// Split a continuation state into interpolation brace depths (outermost first) and the
/// innermost mode.
fn unpack(state: &ContinuationState) -> (Vec<u32>, Mode) {
    let mut frames = Vec::new();
    let mut state = state;
    loop {
        let mode = match state {
            ContinuationState::TemplateInterpolation { brace_depth, inner } => {
                frames.push((*brace_depth).max(1));
                state = inner;
                continue;
            }
            ContinuationState::Neutral | ContinuationState::Heredoc { .. } => Mode::Code,
            ContinuationState::LineComment => Mode::LineComment,
            ContinuationState::BlockComment => Mode::BlockComment,
            ContinuationState::QuotedString { quote } => Mode::Str(*quote),
            ContinuationState::TemplateText => Mode::Template,
        };
        return (frames, mode);
    }
}

/// Inverse of [`unpack`].
fn pack(frames: &[u32], mode: Mode) -> ContinuationState {
    let innermost = match mode {
        Mode::Code => ContinuationState::Neutral,
        Mode::LineComment => ContinuationState::LineComment,
        Mode::BlockComment => ContinuationState::BlockComment,
        Mode::Str(quote) => ContinuationState::QuotedString { quote },
        Mode::Template => ContinuationState::TemplateText,
    };
    frames
        .iter()
        .rev()
        .fold(innermost, |inner, &brace_depth| {
            ContinuationState::TemplateInterpolation {
                brace_depth,
                inner: Box::new(inner),
            }
        })
}

struct TemplatePass<'a> {
    lexicon: &'a Lexicon,
    bytes: &'a [u8],
    pos: usize,
    sink: SpanSink,
    /// Brace depth of each open interpolation, outermost first.
    frames: Vec<u32>,
    mode: Mode,
    /// Start of the template-text span being built.
    text_start: usize,
}

impl TemplatePass<'_> {
    fn run(&mut self) {
        while self.pos < self.bytes.len() {
            match self.mode {
                Mode::Code => self.code(),
                Mode::Template => self.template_text(),
                Mode::LineComment => self.line_comment(self.pos),
                Mode::BlockComment => self.block_comment(self.pos, self.pos),
                Mode::Str(quote) => self.string(self.pos, self.pos, quote),
            }
        }
        if self.mode == Mode::Template {
            self.sink.push_marked(
                self.text_start,
                self.bytes.len(),
                SpanKind::String,
                SpanMarker::Template,
            );
        }
    }

    fn exit_state(&self) -> ContinuationState {
        pack(&self.frames, self.mode)
    }

    /// Scan code until the mode changes or the slice ends.
    fn code(&mut self) {
        let (bytes, lexicon) = (self.bytes, self.lexicon);
        let ident = &lexicon.ident;

        while self.pos < bytes.len() && self.mode == Mode::Code {
            let i = self.pos;
            let b = bytes[i];
            match b {
                b'`' => {
                    self.mode = Mode::Template;
                    self.text_start = i;
                    self.pos = i + 1;
                }
                b'{' => {
                    if let Some(depth) = self.frames.last_mut() {
                        *depth += 1;
                    }
                    self.pos += 1;
                }
                b'}' => {
                    match self.frames.last_mut() {
                        Some(depth) if *depth > 1 => *depth -= 1,
                        Some(_) => {
                            self.frames.pop();
                            self.mode = Mode::Template;
                            self.text_start = i;
                        }
                        None => {}
                    }
                    self.pos += 1;
                }
                b'"' | b'\'' => self.string(i, i + 1, Some(b)),
                b'/' if bytes.get(i + 1) == Some(&b'/') => self.line_comment(i),
                b'/' if bytes.get(i + 1) == Some(&b'*') => self.block_comment(i, i + 2),
                b'/' if regex_allowed(bytes, i, lexicon) => self.regex(i),
                b'0'..=b'9' if i == 0 || !ident.contains(bytes[i - 1]) => {
                    let end = scan_number(bytes, i);
                    self.sink.push(i, end, SpanKind::Number);
                    self.pos = end;
                }
                _ if ident.is_start(b) => {
                    let end = scan_word(bytes, i, lexicon);
                    if !after_member_dot(bytes, i) && lexicon.keywords.contains(&bytes[i..end]) {
                        self.sink.push(i, end, SpanKind::Keyword);
                    }
                    self.pos = end;
                }
                _ => self.pos += 1,
            }
        }
    }

    /// Template text from `self.pos` up to `${`, the closing backtick, or the slice end.
    fn template_text(&mut self) {
        let bytes = self.bytes;
        let mut i = self.pos;
        loop {
            let Some(off) = memchr3(b'`', b'\\', b'$', &bytes[i..]) else {
                self.pos = bytes.len();
                return;
            };
            let j = i + off;
            match bytes[j] {
                b'\\' => i = (j + 2).min(bytes.len()),
                b'$' if bytes.get(j + 1) == Some(&b'{') => {
                    self.sink.push_marked(
                        self.text_start,
                        j + 2,
                        SpanKind::String,
                        SpanMarker::Template,
                    );
                    self.frames.push(1);
                    self.mode = Mode::Code;
                    self.pos = j + 2;
                    return;
                }
                b'`' => {
                    self.sink.push_marked(
                        self.text_start,
                        j + 1,
                        SpanKind::String,
                        SpanMarker::Template,
                    );
                    self.mode = Mode::Code;
                    self.pos = j + 1;
                    return;
                }
                _ => i = j + 1,
            }
        }
    }

    fn line_comment(&mut self, start: usize) {
        let end = line_end(self.bytes, start);
        if end == self.bytes.len() {
            self.sink
                .push_marked(start, end, SpanKind::Comment, SpanMarker::LineComment);
            self.mode = Mode::LineComment;
            self.pos = end;
            return;
        }
        self.sink
            .push_marked(start, end + 1, SpanKind::Comment, SpanMarker::LineComment);
        self.mode = Mode::Code;
        self.pos = end + 1;
    }

    /// Block comment starting at `start`, searching for `*/` from `body`.
    fn block_comment(&mut self, start: usize, body: usize) {
        let bytes = self.bytes;
        match memmem::find(&bytes[body..], b"*/") {
            Some(off) => {
                let end = body + off + 2;
                self.sink
                    .push_marked(start, end, SpanKind::Comment, SpanMarker::BlockComment);
                self.mode = Mode::Code;
                self.pos = end;
            }
            None => {
                self.sink.push_marked(
                    start,
                    bytes.len(),
                    SpanKind::Comment,
                    SpanMarker::BlockComment,
                );
                self.mode = Mode::BlockComment;
                self.pos = bytes.len();
            }
        }
    }

    /// String starting at `start`, body at `body`. An unescaped newline ends it; a
    /// backslash-newline continues it on the next line.
    fn string(&mut self, start: usize, body: usize, quote: Option<u8>) {
        let marker = quote.map_or(SpanMarker::None, SpanMarker::Quote);
        match quoted_body(self.bytes, body, quote, true) {
            Body::Closed(end) => {
                self.sink.push_marked(start, end, SpanKind::String, marker);
                self.mode = Mode::Code;
                self.pos = end;
            }
            Body::Newline(nl) => {
                self.sink.push_marked(start, nl, SpanKind::String, marker);
                self.mode = Mode::Code;
                self.pos = nl;
            }
            Body::Open => {
                let len = self.bytes.len();
                self.sink.push_marked(start, len, SpanKind::String, marker);
                self.mode = Mode::Str(quote);
                self.pos = len;
            }
        }
    }

    /// A regex literal must close on its own line; otherwise the `/` was an operator.
    fn regex(&mut self, start: usize) {
        match regex_body(self.bytes, start + 1, true) {
            Body::Closed(end) => {
                let end = regex_flags(self.bytes, end);
                self.sink
                    .push_marked(start, end, SpanKind::String, SpanMarker::Quote(b'/'));
                self.pos = end;
            }
            Body::Newline(_) | Body::Open => self.pos = start + 1,
        }
    }
}

//! Restartable region scanners.
//!
//! A scanner is a pure function of `(bytes, initial state)`: it reads a slice of the shadow
//! buffer, emits spans in document coordinates (`base` is the slice's document offset) and
//! reports the continuation state left open at the end of the slice. Nothing is committed here;
//! the engine stages the output into the span store.
//!
//! Unterminated constructs are not errors. They produce a dangling span up to the end of the
//! slice and a non-neutral exit state.

mod ini;
mod lex;
mod ruby;
mod template;

pub use ini::KeyValueScanner;
pub use ruby::RubyScanner;
pub use template::TemplateScanner;

use crate::config::Lexicon;
use crate::span::Span;
use crate::state::ContinuationState;
use editor_highlight_lang::GrammarKind;

/// Spans and exit state of one scanner invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutput {
    /// Emitted spans, ascending and non-overlapping.
    pub spans: Vec<Span>,
    /// State left open at the end of the slice.
    pub exit: ContinuationState,
}

/// How the engine drives a scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// One call per dirty segment; resumption state comes from stored spans.
    Region,
    /// One call per line; exit states are kept in the line-state cache.
    LineState,
}

/// The shared scanner protocol.
pub trait RegionScanner {
    /// Scan `bytes` (document offset `base`) starting in `initial`.
    fn scan(
        &self,
        lexicon: &Lexicon,
        bytes: &[u8],
        base: usize,
        initial: &ContinuationState,
    ) -> ScanOutput;
}

/// The closed set of scanners, selected once per document from its grammar family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scanner {
    /// Ruby-family region scanner.
    Ruby(RubyScanner),
    /// C-family / template-literal line-state scanner.
    Template(TemplateScanner),
    /// INI / key-value region scanner.
    KeyValue(KeyValueScanner),
}

impl Scanner {
    /// The scanner for a grammar family.
    pub fn for_grammar(grammar: GrammarKind) -> Self {
        match grammar {
            GrammarKind::Ruby => Self::Ruby(RubyScanner),
            GrammarKind::Template => Self::Template(TemplateScanner),
            GrammarKind::KeyValue => Self::KeyValue(KeyValueScanner),
        }
    }

    /// How this scanner is driven.
    pub fn mode(&self) -> ScanMode {
        match self {
            Self::Ruby(_) | Self::KeyValue(_) => ScanMode::Region,
            Self::Template(_) => ScanMode::LineState,
        }
    }
}

impl RegionScanner for Scanner {
    #[inline]
    fn scan(
        &self,
        lexicon: &Lexicon,
        bytes: &[u8],
        base: usize,
        initial: &ContinuationState,
    ) -> ScanOutput {
        match self {
            Self::Ruby(s) => s.scan(lexicon, bytes, base, initial),
            Self::Template(s) => s.scan(lexicon, bytes, base, initial),
            Self::KeyValue(s) => s.scan(lexicon, bytes, base, initial),
        }
    }
}

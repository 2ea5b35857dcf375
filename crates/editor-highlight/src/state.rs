//! Continuation state: the lexical context left open at a scan boundary.

/// What lexical context is open at a scan boundary.
///
/// It is both a scanner input (what to resume as) and a scanner output (what was left open).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ContinuationState {
    /// Plain code.
    #[default]
    Neutral,
    /// Inside a line comment (only left open when a range ends without a newline).
    LineComment,
    /// Inside a block comment.
    BlockComment,
    /// Inside a quoted literal. `None` means the delimiter is not known yet and will be re-derived
    /// from the text by the scanner.
    QuotedString {
        /// Closing delimiter.
        quote: Option<u8>,
    },
    /// Inside a heredoc body.
    Heredoc {
        /// Terminator identifier.
        terminator: Box<[u8]>,
        /// Whether the terminator may be indented (`<<-` / `<<~`).
        indented: bool,
        /// Whether the heredoc was opened with a single-quoted (non-interpolating) identifier.
        raw: bool,
    },
    /// Inside template-literal text.
    TemplateText,
    /// Inside a `${ ... }` interpolation of a template literal.
    TemplateInterpolation {
        /// Unmatched `{` count, including the one from `${`.
        brace_depth: u32,
        /// What is open inside the interpolation.
        inner: Box<ContinuationState>,
    },
}

/// Coarse classification of a continuation state, as far as it can be recovered from stored
/// spans alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resumption {
    /// Code.
    Neutral,
    /// Inside a comment.
    Comment,
    /// Inside a string-like literal.
    String,
}

impl ContinuationState {
    /// Whether the state is [`ContinuationState::Neutral`].
    pub fn is_neutral(&self) -> bool {
        matches!(self, Self::Neutral)
    }

    /// The class used to compare scanner exit states against stored annotations.
    pub fn resumption(&self) -> Resumption {
        match self {
            Self::Neutral => Resumption::Neutral,
            Self::LineComment | Self::BlockComment => Resumption::Comment,
            Self::QuotedString { .. } | Self::Heredoc { .. } | Self::TemplateText => {
                Resumption::String
            }
            Self::TemplateInterpolation { inner, .. } => inner.resumption(),
        }
    }
}

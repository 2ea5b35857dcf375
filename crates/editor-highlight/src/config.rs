//! Engine configuration: keyword table, identifier characters, theme.
//!
//! All of it is passed to the engine explicitly; swapping any part goes through
//! [`HighlightEngine::reconfigure`](crate::HighlightEngine::reconfigure), which invalidates every
//! cached annotation.

use crate::shadow::PLACEHOLDER;
use editor_highlight_lang::{GrammarKind, LanguageDefinition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Style ID type, mapped to concrete colors/fonts by the host's theme layer.
pub type StyleId = u32;

/// Number of pending spans that triggers a pending-to-main merge.
pub const DEFAULT_MERGE_THRESHOLD: usize = 20_000;

/// Paint role of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorRole {
    /// Keywords.
    Keyword,
    /// Comments.
    Comment,
    /// Strings, heredocs, template text, regexes, symbols.
    String,
    /// Numbers.
    Number,
    /// Identifiers.
    Identifier,
    /// Punctuation.
    Punctuation,
    /// Sigil variables.
    Variable,
    /// Default text.
    Plain,
}

/// Default `StyleId` constants for [`Theme::default`].
pub const STYLE_KEYWORD: StyleId = 0x0500_0001;
/// Default comment style.
pub const STYLE_COMMENT: StyleId = 0x0500_0002;
/// Default string style.
pub const STYLE_STRING: StyleId = 0x0500_0003;
/// Default number style.
pub const STYLE_NUMBER: StyleId = 0x0500_0004;
/// Default identifier style.
pub const STYLE_IDENTIFIER: StyleId = 0x0500_0005;
/// Default punctuation style.
pub const STYLE_PUNCTUATION: StyleId = 0x0500_0006;
/// Default variable style.
pub const STYLE_VARIABLE: StyleId = 0x0500_0007;

/// Color-role to paint mapping.
///
/// Roles without an entry (by default: [`ColorRole::Plain`]) are not painted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Theme {
    styles: BTreeMap<ColorRole, StyleId>,
}

impl Theme {
    /// A theme that paints nothing.
    pub fn empty() -> Self {
        Self {
            styles: BTreeMap::new(),
        }
    }

    /// Set the style for a role.
    pub fn with_style(mut self, role: ColorRole, style: StyleId) -> Self {
        self.styles.insert(role, style);
        self
    }

    /// Style for a role, if painted.
    pub fn style_for(&self, role: ColorRole) -> Option<StyleId> {
        self.styles.get(&role).copied()
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::empty()
            .with_style(ColorRole::Keyword, STYLE_KEYWORD)
            .with_style(ColorRole::Comment, STYLE_COMMENT)
            .with_style(ColorRole::String, STYLE_STRING)
            .with_style(ColorRole::Number, STYLE_NUMBER)
            .with_style(ColorRole::Identifier, STYLE_IDENTIFIER)
            .with_style(ColorRole::Punctuation, STYLE_PUNCTUATION)
            .with_style(ColorRole::Variable, STYLE_VARIABLE)
    }
}

/// Keyword set bucketed by length, each bucket sorted for binary search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordTable {
    buckets: Vec<Vec<Box<[u8]>>>,
    len: usize,
}

impl KeywordTable {
    /// Build a table. Empty and non-ASCII entries are skipped (they can never match shadow bytes).
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut buckets: Vec<Vec<Box<[u8]>>> = Vec::new();
        for kw in keywords {
            let kw = kw.as_ref();
            if kw.is_empty() || !kw.is_ascii() {
                tracing::debug!(keyword = kw, "skipping keyword the shadow buffer cannot match");
                continue;
            }
            if buckets.len() <= kw.len() {
                buckets.resize_with(kw.len() + 1, Vec::new);
            }
            buckets[kw.len()].push(kw.as_bytes().into());
        }

        let mut len = 0;
        for bucket in &mut buckets {
            bucket.sort_unstable();
            bucket.dedup();
            len += bucket.len();
        }
        Self { buckets, len }
    }

    /// Exact, case-sensitive match.
    pub fn contains(&self, word: &[u8]) -> bool {
        self.buckets
            .get(word.len())
            .is_some_and(|bucket| bucket.binary_search_by(|k| (**k).cmp(word)).is_ok())
    }

    /// Number of distinct keywords.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the table is empty (keyword highlighting disabled).
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Byte class table for identifier characters.
///
/// ASCII alphanumerics, `_` and the shadow placeholder are always identifier bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentChars {
    table: [bool; 256],
}

impl IdentChars {
    /// Build a table with `extra` ASCII characters on top of the defaults.
    pub fn new(extra: &str) -> Self {
        let mut table = [false; 256];
        for b in 0..=255u8 {
            table[b as usize] = b.is_ascii_alphanumeric() || b == b'_';
        }
        table[PLACEHOLDER as usize] = true;
        for b in extra.bytes().filter(u8::is_ascii) {
            table[b as usize] = true;
        }
        Self { table }
    }

    /// Whether `b` can appear in an identifier.
    #[inline]
    pub fn contains(&self, b: u8) -> bool {
        self.table[b as usize]
    }

    /// Whether `b` can start an identifier.
    #[inline]
    pub fn is_start(&self, b: u8) -> bool {
        self.contains(b) && !b.is_ascii_digit()
    }
}

impl Default for IdentChars {
    fn default() -> Self {
        Self::new("")
    }
}

/// Everything a scanner needs to classify words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexicon {
    /// Keyword table.
    pub keywords: KeywordTable,
    /// Identifier character set.
    pub ident: IdentChars,
}

impl Lexicon {
    /// Build a lexicon from a keyword list and extra identifier characters.
    pub fn new<I, S>(keywords: I, identifier_chars: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: KeywordTable::new(keywords),
            ident: IdentChars::new(identifier_chars),
        }
    }

    /// Build the lexicon of a language definition.
    pub fn from_definition(definition: &LanguageDefinition) -> Self {
        Self::new(&definition.keywords, &definition.identifier_chars)
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightConfig {
    /// Scanner family.
    pub grammar: GrammarKind,
    /// Keyword table and identifier characters.
    pub lexicon: Lexicon,
    /// Color-role to paint mapping.
    pub theme: Theme,
    /// Pending-overlay size that triggers a merge into the main store.
    pub merge_threshold: usize,
}

impl HighlightConfig {
    /// A configuration with the default theme and merge threshold.
    pub fn new(grammar: GrammarKind, lexicon: Lexicon) -> Self {
        Self {
            grammar,
            lexicon,
            theme: Theme::default(),
            merge_threshold: DEFAULT_MERGE_THRESHOLD,
        }
    }

    /// The configuration for a language definition.
    pub fn for_language(definition: &LanguageDefinition) -> Self {
        Self::new(definition.grammar, Lexicon::from_definition(definition))
    }

    /// Replace the theme.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Replace the merge threshold (at least 1).
    pub fn with_merge_threshold(mut self, threshold: usize) -> Self {
        self.merge_threshold = threshold.max(1);
        self
    }
}

#![warn(missing_docs)]
//! `editor-highlight` - incremental lexical annotation engine for `editor-highlight-lang` languages.
//!
//! # Overview
//!
//! The engine tags ranges of a document with a lexical kind (comment, string, keyword, number,
//! ...) and keeps those tags current while the document is edited. Edits are cheap: they shift
//! stored offsets and mark the touched lines dirty. Scanning happens lazily, only for the range a
//! renderer asks about, and stops as soon as the new scan agrees with what was there before.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  AnnotatedDocument (Rope + shadow + engine) │  ← Convenience host
//! ├─────────────────────────────────────────────┤
//! │  HighlightEngine (note_edit / ensure / ...) │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Attribute Resolver (masking, clipping)     │  ← Paint instructions
//! ├─────────────────────────────────────────────┤
//! │  Span Store + Dirty Ranges + Line Cache     │  ← Incremental state
//! ├─────────────────────────────────────────────┤
//! │  Region Scanners (Ruby, template, INI)      │  ← Restartable lexers
//! ├─────────────────────────────────────────────┤
//! │  Shadow Buffer (one byte per char)          │  ← Scan input
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use editor_highlight::{AnnotatedDocument, ColorRole, HighlightConfig};
//! use editor_highlight_lang::LanguageRegistry;
//!
//! let registry = LanguageRegistry::with_builtins();
//! let js = registry.by_name("javascript").unwrap();
//! let mut doc = AnnotatedDocument::new("let s = `a${x}b`;\n", HighlightConfig::for_language(&js));
//!
//! let roles: Vec<_> = doc
//!     .attributes_in_range(0..17, 4)
//!     .into_iter()
//!     .map(|a| (a.range, a.role))
//!     .collect();
//! assert_eq!(
//!     roles,
//!     vec![
//!         (0..3, ColorRole::Keyword),
//!         (8..12, ColorRole::String),
//!         (13..16, ColorRole::String),
//!     ]
//! );
//!
//! doc.insert(0, "/* ");
//! assert!(!doc.engine().dirty_ranges().is_empty());
//! ```
//!
//! # Module Description
//!
//! - [`shadow`] - one-byte-per-character mirror of the document
//! - [`dirty`] - dirty-range set
//! - [`span`] - span kinds and markers
//! - [`store`] - main span array plus pending overlay
//! - [`state`] - scanner continuation states
//! - [`scanner`] - restartable region scanners
//! - [`line_cache`] - per-line exit states for line-state scanners
//! - [`resolver`] - attribute resolution for a visible range
//! - [`config`] - keyword table, identifier characters, theme
//! - [`engine`] - the incremental engine
//! - [`document`] - text + shadow + engine in one value

pub mod config;
pub mod dirty;
pub mod document;
pub mod engine;
pub mod line_cache;
pub mod resolver;
pub mod scanner;
pub mod shadow;
pub mod span;
pub mod state;
pub mod store;

pub use config::{
    ColorRole, DEFAULT_MERGE_THRESHOLD, HighlightConfig, IdentChars, KeywordTable, Lexicon,
    StyleId, Theme,
};
pub use dirty::DirtyRanges;
pub use document::AnnotatedDocument;
pub use engine::{HighlightEngine, ScanStats};
pub use line_cache::LineStateCache;
pub use resolver::Attribute;
pub use scanner::{RegionScanner, ScanMode, ScanOutput, Scanner};
pub use shadow::{PLACEHOLDER, ShadowBuffer};
pub use span::{Span, SpanKind, SpanMarker};
pub use state::{ContinuationState, Resumption};
pub use store::SpanStore;

#![warn(missing_docs)]
//! `editor-highlight-lang` - data-driven language configuration for `editor-highlight`.
//!
//! This crate intentionally stays free of any scanning code. It describes *what* a language looks
//! like to the lexical annotation engine (grammar family, keywords, identifier characters, comment
//! tokens) and how a document is matched to a language (file extension, first line).
//!
//! Definitions can be built in code, taken from [`LanguageRegistry::with_builtins`], or loaded
//! from YAML:
//!
//! ```rust
//! use editor_highlight_lang::{GrammarKind, LanguageRegistry};
//!
//! let mut registry = LanguageRegistry::with_builtins();
//! let lua = registry
//!     .load_from_str(
//!         r#"
//! name: Lua-ish
//! grammar: ruby
//! file_extensions: [luax]
//! keywords: [function, end, local]
//! "#,
//!     )
//!     .unwrap();
//! assert_eq!(lua.grammar, GrammarKind::Ruby);
//! assert_eq!(registry.for_extension("luax").unwrap().name, "Lua-ish");
//! ```

mod builtin;
mod definition;
mod error;
mod registry;

pub use definition::{GrammarKind, LanguageDefinition, RawLanguageDefinition};
pub use error::LanguageError;
pub use registry::LanguageRegistry;

use serde::{Deserialize, Serialize};

/// Comment tokens/config for a given language.
///
/// The annotation engine's scanners hard-code the comment syntax of their grammar family; this
/// record is what hosts use for language-aware features such as comment toggling.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentConfig {
    /// Line comment token (e.g. `//`, `#`).
    pub line: Option<String>,
    /// Block comment start token (e.g. `/*`, `=begin`).
    pub block_start: Option<String>,
    /// Block comment end token (e.g. `*/`, `=end`).
    pub block_end: Option<String>,
}

impl CommentConfig {
    /// Create a config that supports only line comments.
    pub fn line(token: impl Into<String>) -> Self {
        Self {
            line: Some(token.into()),
            block_start: None,
            block_end: None,
        }
    }

    /// Create a config that supports both line and block comments.
    pub fn line_and_block(
        line: impl Into<String>,
        block_start: impl Into<String>,
        block_end: impl Into<String>,
    ) -> Self {
        Self {
            line: Some(line.into()),
            block_start: Some(block_start.into()),
            block_end: Some(block_end.into()),
        }
    }

    /// Returns `true` if a line comment token is configured.
    pub fn has_line(&self) -> bool {
        self.line.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Returns `true` if both block comment tokens are configured.
    pub fn has_block(&self) -> bool {
        self.block_start.as_deref().is_some_and(|s| !s.is_empty())
            && self.block_end.as_deref().is_some_and(|s| !s.is_empty())
    }
}

//! A self-contained annotated document: text, shadow buffer and engine kept in lockstep.
//!
//! Hosts with their own document layer drive [`HighlightEngine`] directly. `AnnotatedDocument`
//! is for everyone else (and for tests): every mutation goes through [`AnnotatedDocument::edit`],
//! which updates the rope and the shadow buffer and then notifies the engine.

use crate::config::{HighlightConfig, StyleId};
use crate::engine::HighlightEngine;
use crate::resolver::Attribute;
use crate::shadow::ShadowBuffer;
use editor_highlight_lang::LanguageRegistry;
use ropey::Rope;
use std::ops::Range;
use std::path::Path;

/// Document text plus its annotation state.
#[derive(Debug, Clone)]
pub struct AnnotatedDocument {
    text: Rope,
    shadow: ShadowBuffer,
    engine: HighlightEngine,
}

impl AnnotatedDocument {
    /// Create a document from `text`. Nothing is scanned until attributes are requested.
    pub fn new(text: &str, config: HighlightConfig) -> Self {
        let text = Rope::from_str(text);
        let shadow = ShadowBuffer::from_rope(&text);
        let engine = HighlightEngine::new(config, &shadow);
        Self {
            text,
            shadow,
            engine,
        }
    }

    /// Create a document whose language is detected from `path` and the first line of `text`.
    pub fn detect(registry: &LanguageRegistry, path: Option<&Path>, text: &str) -> Option<Self> {
        let first_line = text.lines().next();
        let definition = registry.detect(path, first_line)?;
        tracing::debug!(language = %definition.name, "detected document language");
        Some(Self::new(text, HighlightConfig::for_language(&definition)))
    }

    /// Replace the characters in `range` with `text`.
    pub fn edit(&mut self, range: Range<usize>, text: &str) {
        let range = self.shadow.clamp_range(range);
        if range.is_empty() && text.is_empty() {
            return;
        }

        if !range.is_empty() {
            self.text.remove(range.clone());
        }
        if !text.is_empty() {
            self.text.insert(range.start, text);
        }
        self.shadow.replace(range.clone(), text);
        self.engine
            .note_edit(&self.shadow, range, text.chars().count());
    }

    /// Insert `text` at character offset `at`.
    pub fn insert(&mut self, at: usize, text: &str) {
        self.edit(at..at, text);
    }

    /// Delete the characters in `range`.
    pub fn delete(&mut self, range: Range<usize>) {
        self.edit(range, "");
    }

    /// The document text.
    pub fn text(&self) -> &Rope {
        &self.text
    }

    /// Character count.
    pub fn len_chars(&self) -> usize {
        self.text.len_chars()
    }

    /// The shadow buffer mirroring the text.
    pub fn shadow(&self) -> &ShadowBuffer {
        &self.shadow
    }

    /// The annotation engine.
    pub fn engine(&self) -> &HighlightEngine {
        &self.engine
    }

    /// See [`HighlightEngine::ensure_up_to_date`].
    pub fn ensure_up_to_date(&mut self, range: Range<usize>) {
        self.engine.ensure_up_to_date(&self.shadow, range);
    }

    /// See [`HighlightEngine::attributes_in_range`].
    pub fn attributes_in_range(&mut self, range: Range<usize>, tab_width: usize) -> Vec<Attribute> {
        self.engine
            .attributes_in_range(&self.shadow, range, tab_width)
    }

    /// See [`HighlightEngine::paint_in_range`].
    pub fn paint_in_range(
        &mut self,
        range: Range<usize>,
        tab_width: usize,
    ) -> Vec<(Range<usize>, StyleId)> {
        self.engine.paint_in_range(&self.shadow, range, tab_width)
    }

    /// See [`HighlightEngine::parse`].
    pub fn parse(&mut self, range: Range<usize>) {
        self.engine.parse(&self.shadow, range);
    }

    /// See [`HighlightEngine::merge_pending`].
    pub fn merge_pending(&mut self) {
        self.engine.merge_pending();
    }

    /// See [`HighlightEngine::reconfigure`].
    pub fn reconfigure(&mut self, config: HighlightConfig) {
        self.engine.reconfigure(config, &self.shadow);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColorRole;
    use pretty_assertions::assert_eq;

    fn ruby_doc(text: &str) -> AnnotatedDocument {
        let registry = LanguageRegistry::with_builtins();
        let ruby = registry.by_name("ruby").unwrap();
        AnnotatedDocument::new(text, HighlightConfig::for_language(&ruby))
    }

    #[test]
    fn test_edit_keeps_buffers_in_sync() {
        let mut doc = ruby_doc("caf\u{e9} = 1\n");
        doc.insert(4, "s");
        doc.delete(0..1);
        assert_eq!(doc.text().to_string(), "af\u{e9}s = 1\n");
        assert_eq!(doc.shadow().len(), doc.len_chars());
        assert_eq!(doc.shadow().bytes(), b"af\x7fs = 1\n");
    }

    #[test]
    fn test_non_ascii_offsets_are_char_offsets() {
        let mut doc = ruby_doc("\u{e9}\u{e9} # c\n");
        let attrs = doc.attributes_in_range(0..6, 4);
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].range, 3..6);
        assert_eq!(attrs[0].role, ColorRole::Comment);
    }

    #[test]
    fn test_detect_by_extension_and_shebang() {
        let registry = LanguageRegistry::with_builtins();
        let doc = AnnotatedDocument::detect(&registry, Some(Path::new("app.rb")), "x = 1\n").unwrap();
        assert_eq!(doc.engine().config().grammar.as_str(), "ruby");

        let doc = AnnotatedDocument::detect(&registry, None, "#!/usr/bin/env ruby\nputs 1\n").unwrap();
        assert_eq!(doc.engine().config().grammar.as_str(), "ruby");

        assert!(AnnotatedDocument::detect(&registry, None, "plain\n").is_none());
    }

    #[test]
    fn test_noop_edit_leaves_state_alone() {
        let mut doc = ruby_doc("def a\nend\n");
        doc.ensure_up_to_date(0..doc.len_chars());
        doc.insert(3, "");
        assert!(doc.engine().dirty_ranges().is_empty());
    }
}

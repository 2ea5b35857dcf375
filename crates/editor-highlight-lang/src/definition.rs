use crate::CommentConfig;
use crate::error::LanguageError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The scanner family a language is lexed with.
///
/// This is a closed set: each variant corresponds to one hand-written state machine in
/// `editor-highlight`. It is picked once, when the document type is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrammarKind {
    /// Ruby-family languages: `#` comments, `=begin`/`=end`, heredocs, multi-line strings.
    Ruby,
    /// C-family languages with template literals and `${}` interpolation (JavaScript, TypeScript).
    Template,
    /// Key-value configuration files (INI and friends).
    KeyValue,
}

impl GrammarKind {
    /// The canonical name used in YAML definitions.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ruby => "ruby",
            Self::Template => "template",
            Self::KeyValue => "key-value",
        }
    }
}

impl fmt::Display for GrammarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrammarKind {
    type Err = LanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ruby" => Ok(Self::Ruby),
            "template" | "c-family" | "javascript" => Ok(Self::Template),
            "key-value" | "keyvalue" | "ini" => Ok(Self::KeyValue),
            _ => Err(LanguageError::UnknownGrammar(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
/// Raw YAML language definition, before validation.
pub struct RawLanguageDefinition {
    /// Human-readable language name (unique within a registry).
    pub name: String,

    /// Scanner family name (`ruby`, `template`, `key-value`).
    pub grammar: String,

    #[serde(default)]
    /// File extensions (without the dot) or whole file names (e.g. `Gemfile`).
    pub file_extensions: Vec<String>,

    #[serde(default)]
    /// Optional first-line regex used to detect the language (e.g. a shebang).
    pub first_line_match: Option<String>,

    #[serde(default)]
    /// Keywords, matched exactly (case-sensitive).
    pub keywords: Vec<String>,

    #[serde(default)]
    /// Extra identifier characters on top of ASCII alphanumerics and `_`.
    pub identifier_chars: String,

    #[serde(default)]
    /// Comment tokens.
    pub comments: CommentConfig,
}

/// A validated language definition.
#[derive(Debug, Clone)]
pub struct LanguageDefinition {
    /// Human-readable language name.
    pub name: String,
    /// Scanner family.
    pub grammar: GrammarKind,
    /// File extensions (without the dot) or whole file names.
    pub file_extensions: Vec<String>,
    /// Compiled first-line detection pattern.
    pub first_line_match: Option<Regex>,
    /// Keywords. An empty list is valid and disables keyword highlighting.
    pub keywords: Vec<String>,
    /// Extra identifier characters on top of ASCII alphanumerics and `_`.
    pub identifier_chars: String,
    /// Comment tokens.
    pub comments: CommentConfig,
}

impl LanguageDefinition {
    /// Create a definition with no extensions, keywords or detection pattern.
    pub fn new(name: impl Into<String>, grammar: GrammarKind) -> Self {
        Self {
            name: name.into(),
            grammar,
            file_extensions: Vec::new(),
            first_line_match: None,
            keywords: Vec::new(),
            identifier_chars: String::new(),
            comments: CommentConfig::default(),
        }
    }

    /// Set the keyword list.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Set the file extensions.
    pub fn with_file_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the extra identifier characters.
    pub fn with_identifier_chars(mut self, chars: impl Into<String>) -> Self {
        self.identifier_chars = chars.into();
        self
    }

    /// Set the comment tokens.
    pub fn with_comments(mut self, comments: CommentConfig) -> Self {
        self.comments = comments;
        self
    }

    /// Set the first-line detection pattern.
    pub fn with_first_line_match(mut self, pattern: &str) -> Result<Self, LanguageError> {
        self.first_line_match = Some(Regex::new(pattern)?);
        Ok(self)
    }

    /// Validate a raw definition.
    pub fn from_raw(raw: RawLanguageDefinition) -> Result<Self, LanguageError> {
        let grammar = raw.grammar.parse::<GrammarKind>()?;
        let first_line_match = raw
            .first_line_match
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(Regex::new)
            .transpose()?;

        let definition = Self {
            name: raw.name.trim().to_string(),
            grammar,
            file_extensions: raw
                .file_extensions
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .filter(|ext| !ext.is_empty())
                .collect(),
            first_line_match,
            keywords: raw.keywords,
            identifier_chars: raw.identifier_chars,
            comments: raw.comments,
        };
        definition.validate()?;
        Ok(definition)
    }

    /// Parse and validate a YAML definition.
    pub fn from_yaml(yaml: &str) -> Result<Self, LanguageError> {
        let raw: RawLanguageDefinition = serde_yaml::from_str(yaml)?;
        Self::from_raw(raw)
    }

    /// Check the invariants the annotation engine relies on.
    ///
    /// The shadow buffer collapses every non-ASCII character to a single placeholder byte, so
    /// keywords and identifier characters must be ASCII to be matched at all.
    pub fn validate(&self) -> Result<(), LanguageError> {
        if self.name.trim().is_empty() {
            return Err(LanguageError::EmptyName);
        }
        if let Some(ch) = self.identifier_chars.chars().find(|c| !c.is_ascii()) {
            return Err(LanguageError::NonAsciiIdentifierChar(ch));
        }
        if let Some(kw) = self.keywords.iter().find(|k| !k.is_ascii()) {
            return Err(LanguageError::NonAsciiKeyword(kw.clone()));
        }
        Ok(())
    }

    /// Whether `first_line` matches this language's detection pattern.
    pub fn matches_first_line(&self, first_line: &str) -> bool {
        self.first_line_match
            .as_ref()
            .is_some_and(|re| re.is_match(first_line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_kind_from_str() {
        assert_eq!("ruby".parse::<GrammarKind>().unwrap(), GrammarKind::Ruby);
        assert_eq!(
            " Template ".parse::<GrammarKind>().unwrap(),
            GrammarKind::Template
        );
        assert_eq!("ini".parse::<GrammarKind>().unwrap(), GrammarKind::KeyValue);
        assert!(matches!(
            "lisp".parse::<GrammarKind>(),
            Err(LanguageError::UnknownGrammar(name)) if name == "lisp"
        ));
    }

    #[test]
    fn test_from_yaml_validates_and_normalizes() {
        let def = LanguageDefinition::from_yaml(
            r##"
name: "  Crystal "
grammar: ruby
file_extensions: [".cr", ""]
first_line_match: '^#!.*\bcrystal\b'
keywords: [def, end]
identifier_chars: "?"
comments:
  line: "#"
"##,
        )
        .unwrap();

        assert_eq!(def.name, "Crystal");
        assert_eq!(def.file_extensions, vec!["cr".to_string()]);
        assert!(def.matches_first_line("#!/usr/bin/env crystal"));
        assert!(!def.matches_first_line("puts 1"));
        assert!(def.comments.has_line());
    }

    #[test]
    fn test_rejects_non_ascii() {
        let err = LanguageDefinition::new("x", GrammarKind::Ruby)
            .with_identifier_chars("é")
            .validate()
            .unwrap_err();
        assert!(matches!(err, LanguageError::NonAsciiIdentifierChar('é')));

        let err = LanguageDefinition::new("x", GrammarKind::Ruby)
            .with_keywords(["función"])
            .validate()
            .unwrap_err();
        assert!(matches!(err, LanguageError::NonAsciiKeyword(_)));
    }

    #[test]
    fn test_empty_keywords_are_valid() {
        let def = LanguageDefinition::from_yaml("name: plain\ngrammar: key-value\n").unwrap();
        assert!(def.keywords.is_empty());
        assert_eq!(def.grammar, GrammarKind::KeyValue);
    }

    #[test]
    fn test_bad_first_line_regex() {
        let err =
            LanguageDefinition::from_yaml("name: x\ngrammar: ruby\nfirst_line_match: '(['\n")
                .unwrap_err();
        assert!(matches!(err, LanguageError::FirstLineMatch(_)));
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced while loading or registering language definitions.
pub enum LanguageError {
    #[error("YAML parse error: {0}")]
    /// YAML parsing failed.
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    /// Filesystem I/O failed.
    Io(#[from] std::io::Error),

    #[error("invalid first_line_match pattern: {0}")]
    /// The first-line detection regex failed to compile.
    FirstLineMatch(#[from] regex::Error),

    #[error("unknown grammar family '{0}' (expected ruby, template or key-value)")]
    /// The `grammar` field names no supported scanner family.
    UnknownGrammar(String),

    #[error("identifier characters must be ASCII, found {0:?}")]
    /// `identifier_chars` contained a character the shadow buffer cannot represent.
    NonAsciiIdentifierChar(char),

    #[error("keywords must be ASCII, found {0:?}")]
    /// A keyword contained a character the shadow buffer cannot represent.
    NonAsciiKeyword(String),

    #[error("language name must not be empty")]
    /// The definition had an empty `name`.
    EmptyName,

    #[error("language '{0}' is already registered")]
    /// A language with the same (case-insensitive) name already exists in the registry.
    DuplicateLanguage(String),
}

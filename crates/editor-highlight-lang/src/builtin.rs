//! Built-in language definitions.

use crate::CommentConfig;
use crate::definition::{GrammarKind, LanguageDefinition};

const RUBY_KEYWORDS: &[&str] = &[
    "BEGIN",
    "END",
    "__ENCODING__",
    "__FILE__",
    "__LINE__",
    "alias",
    "and",
    "begin",
    "break",
    "case",
    "class",
    "def",
    "defined?",
    "do",
    "else",
    "elsif",
    "end",
    "ensure",
    "false",
    "for",
    "if",
    "in",
    "module",
    "next",
    "nil",
    "not",
    "or",
    "redo",
    "rescue",
    "retry",
    "return",
    "self",
    "super",
    "then",
    "true",
    "undef",
    "unless",
    "until",
    "when",
    "while",
    "yield",
];

const JAVASCRIPT_KEYWORDS: &[&str] = &[
    "async",
    "await",
    "break",
    "case",
    "catch",
    "class",
    "const",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "else",
    "export",
    "extends",
    "false",
    "finally",
    "for",
    "from",
    "function",
    "if",
    "import",
    "in",
    "instanceof",
    "let",
    "new",
    "null",
    "of",
    "return",
    "static",
    "super",
    "switch",
    "this",
    "throw",
    "true",
    "try",
    "typeof",
    "undefined",
    "var",
    "void",
    "while",
    "with",
    "yield",
];

const TYPESCRIPT_EXTRA_KEYWORDS: &[&str] = &[
    "abstract",
    "as",
    "declare",
    "enum",
    "implements",
    "interface",
    "keyof",
    "namespace",
    "private",
    "protected",
    "public",
    "readonly",
    "type",
];

const INI_KEYWORDS: &[&str] = &["false", "no", "none", "null", "off", "on", "true", "yes"];

pub(crate) fn ruby() -> LanguageDefinition {
    LanguageDefinition::new("Ruby", GrammarKind::Ruby)
        .with_file_extensions([
            "rb", "rake", "gemspec", "ru", "rbw", "Gemfile", "Rakefile", "Guardfile",
        ])
        .with_keywords(RUBY_KEYWORDS.iter().copied())
        .with_comments(CommentConfig::line_and_block("#", "=begin", "=end"))
        .with_first_line_match(r"^#!.*\bruby\b")
        .expect("valid built-in shebang pattern")
}

pub(crate) fn javascript() -> LanguageDefinition {
    LanguageDefinition::new("JavaScript", GrammarKind::Template)
        .with_file_extensions(["js", "mjs", "cjs", "jsx"])
        .with_keywords(JAVASCRIPT_KEYWORDS.iter().copied())
        .with_identifier_chars("$")
        .with_comments(CommentConfig::line_and_block("//", "/*", "*/"))
        .with_first_line_match(r"^#!.*\b(node|deno|bun)\b")
        .expect("valid built-in shebang pattern")
}

pub(crate) fn typescript() -> LanguageDefinition {
    LanguageDefinition::new("TypeScript", GrammarKind::Template)
        .with_file_extensions(["ts", "mts", "cts", "tsx"])
        .with_keywords(
            JAVASCRIPT_KEYWORDS
                .iter()
                .chain(TYPESCRIPT_EXTRA_KEYWORDS.iter())
                .copied(),
        )
        .with_identifier_chars("$")
        .with_comments(CommentConfig::line_and_block("//", "/*", "*/"))
}

pub(crate) fn ini() -> LanguageDefinition {
    LanguageDefinition::new("INI", GrammarKind::KeyValue)
        .with_file_extensions(["ini", "cfg", "conf", "properties", "desktop", "editorconfig"])
        .with_keywords(INI_KEYWORDS.iter().copied())
        .with_identifier_chars("-.")
        .with_comments(CommentConfig::line(";"))
}

pub(crate) fn all() -> Vec<LanguageDefinition> {
    vec![ruby(), javascript(), typescript(), ini()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_valid() {
        for def in all() {
            def.validate().unwrap();
        }
    }

    #[test]
    fn test_builtin_shebangs_compile() {
        assert!(ruby().matches_first_line("#!/usr/bin/env ruby -w"));
        assert!(javascript().matches_first_line("#!/usr/bin/env node"));
        assert!(typescript().first_line_match.is_none());
    }
}

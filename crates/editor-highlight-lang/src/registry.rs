use crate::builtin;
use crate::definition::LanguageDefinition;
use crate::error::LanguageError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Default)]
/// A collection of language definitions, with lookup by name, file extension and first line.
pub struct LanguageRegistry {
    languages: Vec<Arc<LanguageDefinition>>,
    by_name: HashMap<String, usize>,
    by_extension: HashMap<String, usize>,
}

impl LanguageRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with the built-in Ruby, JavaScript, TypeScript and INI
    /// definitions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for def in builtin::all() {
            registry
                .register(def)
                .expect("built-in language names are distinct");
        }
        registry
    }

    /// Register a definition.
    ///
    /// Extensions already claimed by an earlier definition are re-pointed to the new one, so a
    /// host can override a built-in mapping by registering its own language afterwards.
    pub fn register(
        &mut self,
        definition: LanguageDefinition,
    ) -> Result<Arc<LanguageDefinition>, LanguageError> {
        definition.validate()?;

        let key = definition.name.to_ascii_lowercase();
        if self.by_name.contains_key(&key) {
            return Err(LanguageError::DuplicateLanguage(definition.name));
        }

        let idx = self.languages.len();
        for ext in &definition.file_extensions {
            self.by_extension.insert(ext.to_ascii_lowercase(), idx);
        }
        self.by_name.insert(key, idx);

        tracing::debug!(
            language = %definition.name,
            grammar = %definition.grammar,
            keywords = definition.keywords.len(),
            "registered language definition"
        );

        let definition = Arc::new(definition);
        self.languages.push(definition.clone());
        Ok(definition)
    }

    /// Loads a definition from a YAML string and registers it.
    pub fn load_from_str(&mut self, yaml: &str) -> Result<Arc<LanguageDefinition>, LanguageError> {
        let definition = LanguageDefinition::from_yaml(yaml)?;
        self.register(definition)
    }

    /// Loads a definition from a YAML file and registers it.
    pub fn load_from_path(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<Arc<LanguageDefinition>, LanguageError> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        self.load_from_str(&yaml)
    }

    /// Look up a language by name (case-insensitive).
    pub fn by_name(&self, name: &str) -> Option<Arc<LanguageDefinition>> {
        self.by_name
            .get(&name.to_ascii_lowercase())
            .map(|&idx| self.languages[idx].clone())
    }

    /// Look up a language by file extension (without the dot) or whole file name.
    pub fn for_extension(&self, ext: &str) -> Option<Arc<LanguageDefinition>> {
        self.by_extension
            .get(&ext.trim_start_matches('.').to_ascii_lowercase())
            .map(|&idx| self.languages[idx].clone())
    }

    /// Detect the language of a document.
    ///
    /// The whole file name is tried first (`Gemfile`), then its extension, then every first-line
    /// pattern in registration order.
    pub fn detect(
        &self,
        path: Option<&Path>,
        first_line: Option<&str>,
    ) -> Option<Arc<LanguageDefinition>> {
        if let Some(path) = path {
            let by_file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| self.for_extension(n));
            let by_ext = || {
                path.extension()
                    .and_then(|e| e.to_str())
                    .and_then(|e| self.for_extension(e))
            };
            if let Some(def) = by_file_name.or_else(by_ext) {
                return Some(def);
            }
        }

        let first_line = first_line?;
        self.languages
            .iter()
            .find(|def| def.matches_first_line(first_line))
            .cloned()
    }

    /// Names of all registered languages, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.languages.iter().map(|d| d.name.as_str()).collect()
    }

    /// Number of registered languages.
    pub fn len(&self) -> usize {
        self.languages.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

//! Language code to display name lookup

use std::collections::BTreeMap;

/// Built-in codes understood by the prompt builder
const BUILTIN_LANGUAGES: &[(&str, &str)] = &[
    ("vi", "Vietnamese"),
    ("id", "Indonesian"),
    ("th", "Thai"),
    ("zh", "Chinese"),
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("ru", "Russian"),
    ("ar", "Arabic"),
    ("pt", "Portuguese"),
];

/// Immutable mapping from short codes to language names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageTable {
    codes: BTreeMap<String, String>,
}

impl LanguageTable {
    /// Table with the built-in languages
    pub fn builtin() -> Self {
        Self {
            codes: BUILTIN_LANGUAGES
                .iter()
                .map(|(code, name)| (code.to_string(), name.to_string()))
                .collect(),
        }
    }

    /// Map a code to its full name.
    ///
    /// Lookup is case-insensitive. Unknown input, including full names, is
    /// returned unchanged.
    pub fn resolve(&self, code: &str) -> String {
        self.codes
            .get(&code.to_lowercase())
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }

    /// All known codes and names, ordered by code
    pub fn codes(&self) -> &BTreeMap<String, String> {
        &self.codes
    }
}

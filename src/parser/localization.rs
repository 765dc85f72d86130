//! Localized tokens printed by MSTest.
//!
//! MSTest prints outcome labels and the final summary header in the
//! language of the installed Visual Studio. The parser matches lines against
//! the tokens of one language, selected by code when the parser is built.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Language used when a requested code is not in the table.
pub const DEFAULT_LANGUAGE: &str = "en";

const BUILTIN_TABLE: &str = include_str!("localization.json");

/// Tokens MSTest prints for a single language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Messages {
    /// Outcome label for a passing test.
    pub passed: String,
    /// Outcome label for a failing test.
    pub failed: String,
    /// Outcome label for an inconclusive test.
    pub inconclusive: String,
    /// Header that opens the final summary block.
    pub final_test_results: String,
}

impl Messages {
    /// English tokens.
    #[must_use]
    pub fn english() -> Self {
        Self {
            passed: "Passed".to_string(),
            failed: "Failed".to_string(),
            inconclusive: "Inconclusive".to_string(),
            final_test_results: "Final Test Results:".to_string(),
        }
    }

    /// Outcome labels in the order they are tried against a line.
    #[must_use]
    pub fn outcomes(&self) -> [&str; 3] {
        [
            self.passed.as_str(),
            self.failed.as_str(),
            self.inconclusive.as_str(),
        ]
    }

    /// Name of the first empty token, if any. An empty token would match
    /// every line.
    fn empty_token(&self) -> Option<&'static str> {
        [
            ("Passed", &self.passed),
            ("Failed", &self.failed),
            ("Inconclusive", &self.inconclusive),
            ("FinalTestResults", &self.final_test_results),
        ]
        .into_iter()
        .find_map(|(name, token)| token.trim().is_empty().then_some(name))
    }
}

/// Error loading a localization table.
#[derive(thiserror::Error, Debug)]
pub enum LocalizationError {
    /// The table is not valid JSON or is missing tokens.
    #[error("Invalid localization table: {0}")]
    Parse(#[from] serde_json::Error),
    /// The table has no entry for the default language.
    #[error("Localization table has no \"en\" entry")]
    MissingDefault,
    /// A token is empty and would match every line.
    #[error("Localization \"{language}\" has an empty {token} token")]
    EmptyToken {
        language: String,
        token: &'static str,
    },
}

/// Language code to token mapping. Read-only once loaded.
#[derive(Debug, Clone)]
pub struct LocalizationTable {
    languages: HashMap<String, Messages>,
    fallback: Messages,
}

impl LocalizationTable {
    /// Parse a table from JSON of the form `{"en": {"Passed": ..., ...}}`.
    ///
    /// # Errors
    ///
    /// Returns `LocalizationError` if the JSON is malformed, lacks the
    /// default language, or has an empty token.
    pub fn from_json(json: &str) -> Result<Self, LocalizationError> {
        let languages: HashMap<String, Messages> = serde_json::from_str(json)?;
        for (language, messages) in &languages {
            if let Some(token) = messages.empty_token() {
                return Err(LocalizationError::EmptyToken {
                    language: language.clone(),
                    token,
                });
            }
        }
        let fallback = languages
            .get(DEFAULT_LANGUAGE)
            .cloned()
            .ok_or(LocalizationError::MissingDefault)?;
        Ok(Self {
            languages,
            fallback,
        })
    }

    /// The table shipped with the crate.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_TABLE).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Built-in localization table is invalid, using English only");
            Self::english_only()
        })
    }

    fn english_only() -> Self {
        let fallback = Messages::english();
        let languages = HashMap::from([(DEFAULT_LANGUAGE.to_string(), fallback.clone())]);
        Self {
            languages,
            fallback,
        }
    }

    /// Tokens for `language`, or the default language's tokens if unknown.
    #[must_use]
    pub fn resolve(&self, language: &str) -> &Messages {
        self.languages.get(language).unwrap_or_else(|| {
            tracing::debug!(language, "Unknown language, falling back to {DEFAULT_LANGUAGE}");
            &self.fallback
        })
    }

    /// Whether the table has an entry for `language`.
    #[must_use]
    pub fn contains(&self, language: &str) -> bool {
        self.languages.contains_key(language)
    }

    /// Known language codes, sorted.
    #[must_use]
    pub fn languages(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.languages.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}

impl Default for LocalizationTable {
    fn default() -> Self {
        Self::builtin()
    }
}

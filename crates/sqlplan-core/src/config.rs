//! Parser configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Options fixed for the lifetime of a [`crate::SqlParser`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Keep identifier case as written instead of lower-casing.
    pub case_sensitive: bool,
    /// Capture literals of cacheable statements as parameters.
    pub tokenize_literals: bool,
    /// Route INSERT/PUT bodies that fail to parse to external DML handling.
    pub external_dml_fallback: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            tokenize_literals: true,
            external_dml_fallback: true,
        }
    }
}

/// A configuration document could not be read.
#[derive(Debug, Error)]
#[error("invalid parser configuration: {0}")]
pub struct ConfigError(#[from] serde_json::Error);

impl ParserConfig {
    /// Reads a configuration from JSON. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON or has fields of
    /// the wrong type.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets [`Self::case_sensitive`].
    #[must_use]
    pub const fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Sets [`Self::tokenize_literals`].
    #[must_use]
    pub const fn with_tokenize_literals(mut self, tokenize_literals: bool) -> Self {
        self.tokenize_literals = tokenize_literals;
        self
    }

    /// Sets [`Self::external_dml_fallback`].
    #[must_use]
    pub const fn with_external_dml_fallback(mut self, external_dml_fallback: bool) -> Self {
        self.external_dml_fallback = external_dml_fallback;
        self
    }
}

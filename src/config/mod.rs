//! Transformer configuration.
//!
//! An [`ExtractConfig`] names the input field and lists the expressions to
//! evaluate. It can be built in code or read from JSON:
//!
//! ```json
//! {
//!   "column": "xml value",
//!   "expressions": ["/books/book[1]/text()", "/books/book/text()"],
//!   "parse": { "max_depth": 64 }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parser::input::{DEFAULT_MAX_ATTRIBUTES, DEFAULT_MAX_DEPTH, DEFAULT_MAX_ENTITY_EXPANSIONS};
use crate::parser::ParseOptions;

/// Errors raised while loading or validating configuration.
///
/// These are setup errors. They never occur while processing rows.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config{}: {source}", in_file(.path.as_deref()))]
    Json {
        path: Option<PathBuf>,
        #[source]
        source: serde_json::Error,
    },

    #[error("no input column configured")]
    MissingColumn,

    #[error("no XPath expressions configured")]
    NoExpressions,
}

fn in_file(path: Option<&Path>) -> String {
    path.map(|p| format!(" in {}", p.display()))
        .unwrap_or_default()
}

/// Limits applied when parsing each row's XML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseSettings {
    /// Drop whitespace-only text nodes.
    pub no_blanks: bool,
    pub max_depth: u32,
    pub max_attributes: u32,
    pub max_entity_expansions: u32,
}

impl Default for ParseSettings {
    fn default() -> Self {
        Self {
            no_blanks: false,
            max_depth: DEFAULT_MAX_DEPTH,
            max_attributes: DEFAULT_MAX_ATTRIBUTES,
            max_entity_expansions: DEFAULT_MAX_ENTITY_EXPANSIONS,
        }
    }
}

impl From<&ParseSettings> for ParseOptions {
    fn from(settings: &ParseSettings) -> Self {
        ParseOptions::default()
            .no_blanks(settings.no_blanks)
            .max_depth(settings.max_depth)
            .max_attributes(settings.max_attributes)
            .max_entity_expansions(settings.max_entity_expansions)
    }
}

/// Configuration of one XPath transformer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractConfig {
    /// Name of the input field holding the XML.
    pub column: String,
    /// Expressions in output order.
    pub expressions: Vec<String>,
    #[serde(default)]
    pub parse: ParseSettings,
}

impl ExtractConfig {
    /// A configuration for `column` with no expressions yet.
    ///
    /// ```
    /// use xmlselect::config::ExtractConfig;
    ///
    /// let config = ExtractConfig::new("xml value")
    ///     .expression("/books/book[1]/text()")
    ///     .expression("/books/book[2]/text()");
    /// assert_eq!(config.expressions.len(), 2);
    /// assert!(config.validate().is_ok());
    /// ```
    #[must_use]
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            expressions: Vec::new(),
            parse: ParseSettings::default(),
        }
    }

    /// Appends one expression.
    #[must_use]
    pub fn expression(mut self, expression: impl Into<String>) -> Self {
        self.expressions.push(expression.into());
        self
    }

    /// Appends several expressions, in order.
    #[must_use]
    pub fn expressions<I, S>(mut self, expressions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expressions.extend(expressions.into_iter().map(Into::into));
        self
    }

    /// Replaces the parse limits.
    #[must_use]
    pub fn parse_settings(mut self, parse: ParseSettings) -> Self {
        self.parse = parse;
        self
    }

    /// The parser options for row values.
    #[must_use]
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::from(&self.parse)
    }

    /// Reads a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the text is not a valid configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Json { path: None, source })
    }

    /// Reads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Json`] if it is not a valid configuration.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: Some(path.to_path_buf()),
            source,
        })
    }

    /// Checks that a column and at least one expression are configured.
    ///
    /// Individual expressions are not checked here; one that fails to
    /// compile only empties its own column.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingColumn`] or [`ConfigError::NoExpressions`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.column.trim().is_empty() {
            return Err(ConfigError::MissingColumn);
        }
        if self.expressions.is_empty() {
            return Err(ConfigError::NoExpressions);
        }
        Ok(())
    }
}

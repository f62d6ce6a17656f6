//! Compiler options
//!
//! Read from the `[compiler]` table of a TOML file:
//!
//! ```toml
//! [compiler]
//! line_separator = "crlf"
//! reference_field = "$"
//! temporary_prefix = "$t"
//! warnings_as_errors = true
//! indent = "  "
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading options
#[derive(Debug, Error)]
pub enum OptionsError {
    /// Failed to read the options file
    #[error("Failed to read options file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse options: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("Failed to serialize options: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Option value out of range
    #[error("Invalid option: {0}")]
    ValidationError(String),
}

/// Line separator used when joining multi-line output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineSeparator {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    Crlf,
}

impl LineSeparator {
    /// The separator text
    pub fn as_str(&self) -> &'static str {
        match self {
            LineSeparator::Lf => "\n",
            LineSeparator::Crlf => "\r\n",
        }
    }
}

/// Options that affect lowering and output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerOptions {
    /// Separator for multi-line comments and printed output
    #[serde(default)]
    pub line_separator: LineSeparator,

    /// Field name of reference-semantics containers (default: "$")
    #[serde(default = "default_reference_field")]
    pub reference_field: String,

    /// Name prefix of compiler temporaries (default: "$t")
    #[serde(default = "default_temporary_prefix")]
    pub temporary_prefix: String,

    /// Report warnings as errors
    #[serde(default)]
    pub warnings_as_errors: bool,

    /// Indentation unit of printed output (default: four spaces)
    #[serde(default = "default_indent")]
    pub indent: String,
}

fn default_reference_field() -> String {
    "$".to_string()
}

fn default_temporary_prefix() -> String {
    "$t".to_string()
}

fn default_indent() -> String {
    "    ".to_string()
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            line_separator: LineSeparator::default(),
            reference_field: default_reference_field(),
            temporary_prefix: default_temporary_prefix(),
            warnings_as_errors: false,
            indent: default_indent(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct OptionsFile {
    #[serde(default)]
    compiler: CompilerOptions,
}

impl CompilerOptions {
    /// Load options from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, OptionsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse options from TOML text; a missing `[compiler]` table yields
    /// the defaults
    pub fn from_toml_str(content: &str) -> Result<Self, OptionsError> {
        let file: OptionsFile = toml::from_str(content)?;
        file.compiler.validate()?;
        Ok(file.compiler)
    }

    /// Serialize as a TOML document with a `[compiler]` table
    pub fn to_toml_string(&self) -> Result<String, OptionsError> {
        let file = OptionsFile {
            compiler: self.clone(),
        };
        Ok(toml::to_string_pretty(&file)?)
    }

    /// Validate option values
    pub fn validate(&self) -> Result<(), OptionsError> {
        if !is_identifier(&self.reference_field) {
            return Err(OptionsError::ValidationError(format!(
                "reference_field must be an identifier, got '{}'",
                self.reference_field
            )));
        }
        if !is_identifier(&self.temporary_prefix) {
            return Err(OptionsError::ValidationError(format!(
                "temporary_prefix must be an identifier, got '{}'",
                self.temporary_prefix
            )));
        }
        if self.indent.chars().any(|c| c != ' ' && c != '\t') {
            return Err(OptionsError::ValidationError(
                "indent may only contain spaces and tabs".to_string(),
            ));
        }
        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

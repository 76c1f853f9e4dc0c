//! Error types for loading schema documents.
//!
//! One error type covers every way a load can fail: reading the file,
//! parsing XML or YAML, writing the JSON report, an inconsistent parse rule,
//! or a document that does not validate.

use aggregate_schema_core::{RuleError, SchemaErrors};
use thiserror::Error;

/// Errors that can occur while loading and validating a schema.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed XML.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization failure (error reports).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configured rule is inconsistent.
    #[error("invalid parse rule: {0}")]
    Rule(#[from] RuleError),

    /// Well-formed XML that is not a schema document.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// The document parsed but failed validation.
    #[error("schema has {} error(s):\n{0}", .0.len())]
    Validation(#[from] SchemaErrors),

    /// All configured loader sources failed.
    #[error("no schema sources available")]
    NoSourcesAvailable,
}

/// Convenience alias for results with [`LoaderError`].
pub type Result<T> = std::result::Result<T, LoaderError>;

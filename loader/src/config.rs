//! Compiler configuration.
//!
//! A YAML file that picks the schema vocabulary (discriminator attribute and
//! markers), restricts which models a document may declare, and says where
//! to write the error report of a failed load.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! rule:
//!   discriminator: Type
//!   child_marker: child
//!   children_marker: children
//!   ref_prefix: "ref-to:"
//! models:
//!   - data-model
//!   - query-model
//!   - enum
//! exclude:
//!   - value-object
//! report:
//!   errors_json: target/schema-errors.json
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use aggregate_schema_core::{
    DEFAULT_CHILD_MARKER, DEFAULT_CHILDREN_MARKER, DEFAULT_DISCRIMINATOR, DEFAULT_REF_PREFIX,
    ModelKind, SchemaParseRule,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Attribute names and markers of the schema language.
///
/// # Examples
///
/// ```
/// # use aggregate_schema_loader::RuleConfig;
/// let rule = RuleConfig::default();
/// assert_eq!(rule.discriminator, "Type");
/// assert_eq!(rule.ref_prefix, "ref-to:");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Attribute carrying a node's type.
    pub discriminator: String,
    /// Discriminator value of a nested-one aggregate.
    pub child_marker: String,
    /// Discriminator value of a nested-many aggregate.
    pub children_marker: String,
    /// Prefix of a reference discriminator.
    pub ref_prefix: String,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            discriminator: DEFAULT_DISCRIMINATOR.into(),
            child_marker: DEFAULT_CHILD_MARKER.into(),
            children_marker: DEFAULT_CHILDREN_MARKER.into(),
            ref_prefix: DEFAULT_REF_PREFIX.into(),
        }
    }
}

/// Where to write diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// JSON error report written when validation fails.
    pub errors_json: Option<PathBuf>,
}

/// Top-level compiler configuration.
///
/// Usually loaded from a YAML file next to the schema document.
///
/// # Examples
///
/// ```no_run
/// use aggregate_schema_loader::CompilerConfig;
///
/// let config = CompilerConfig::load("schema-compiler.yml").unwrap();
/// if config.is_allowed("query-model") {
///     println!("query models enabled");
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    #[serde(default)]
    pub rule: RuleConfig,
    /// Models a document may declare (empty = all).
    #[serde(default)]
    pub models: Vec<String>,
    /// Models to disable.
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub report: ReportConfig,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            version: "1.0".into(),
            rule: RuleConfig::default(),
            models: Vec::new(),
            exclude: Vec::new(),
            report: ReportConfig::default(),
        }
    }
}

impl CompilerConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::LoaderError::Io) if the file cannot be read, or
    /// [`Yaml`](crate::LoaderError::Yaml) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::LoaderError::Io) if the file cannot be written,
    /// or [`Yaml`](crate::LoaderError::Yaml) if serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Returns `true` if `model` is in the exclusion list.
    pub fn is_excluded(&self, model: &str) -> bool {
        self.exclude.iter().any(|m| m == model)
    }

    /// Returns `true` if documents may declare roots of `model`.
    ///
    /// An empty `models` list allows every model that is not excluded.
    ///
    /// # Examples
    ///
    /// ```
    /// # let yaml = r#"
    /// # version: "1.0"
    /// # models: [data-model, enum]
    /// # exclude: [enum]
    /// # "#;
    /// # let config: aggregate_schema_loader::CompilerConfig = serde_yaml::from_str(yaml).unwrap();
    /// assert!(config.is_allowed("data-model"));
    /// assert!(!config.is_allowed("query-model"));
    /// assert!(!config.is_allowed("enum"));
    /// ```
    pub fn is_allowed(&self, model: &str) -> bool {
        if self.is_excluded(model) {
            return false;
        }
        self.models.is_empty() || self.models.iter().any(|m| m == model)
    }

    /// The parse rule this configuration describes.
    ///
    /// Value types and options are always the builtin sets. Model names
    /// that match no [`ModelKind`] are ignored here; the rule itself is
    /// checked when the parse context is built.
    pub fn to_rule(&self) -> SchemaParseRule {
        SchemaParseRule {
            discriminator: self.rule.discriminator.clone(),
            child_marker: self.rule.child_marker.clone(),
            children_marker: self.rule.children_marker.clone(),
            ref_prefix: self.rule.ref_prefix.clone(),
            models: ModelKind::ALL
                .into_iter()
                .filter(|m| self.is_allowed(m.schema_name()))
                .collect(),
            ..SchemaParseRule::default()
        }
    }
}

//! Vocabulary of the schema language.
//!
//! [`SchemaParseRule`] names the discriminator attribute, the nested and
//! reference markers, the model kinds a root may declare, the builtin
//! value-member types and the recognized node options. A rule is checked
//! once with [`SchemaParseRule::ensure_consistent`] before any document is
//! parsed with it.
//!
//! # Examples
//!
//! ```
//! use aggregate_schema_core::{ModelKind, SchemaParseRule};
//!
//! let rule = SchemaParseRule::default();
//! assert!(rule.ensure_consistent().is_ok());
//! assert_eq!(rule.model("data-model"), Some(ModelKind::DataModel));
//! assert!(rule.builtin_value_type("word").is_some());
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::options::NodeOption;
use crate::value_type::ValueMemberType;

/// Default name of the type-discriminator attribute.
pub const DEFAULT_DISCRIMINATOR: &str = "Type";
/// Default marker for a nested-one aggregate.
pub const DEFAULT_CHILD_MARKER: &str = "child";
/// Default marker for a nested-many aggregate.
pub const DEFAULT_CHILDREN_MARKER: &str = "children";
/// Default prefix of a reference discriminator (`ref-to:Root/Child`).
pub const DEFAULT_REF_PREFIX: &str = "ref-to:";

/// The model a root aggregate belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    /// Durable storage; rows need a durable identity.
    DataModel,
    /// Read projection.
    QueryModel,
    /// Behavior / command parameters.
    CommandModel,
    /// Static enumeration definition.
    #[serde(rename = "enum")]
    StaticEnum,
    /// Value object usable as a member type.
    ValueObject,
}

impl ModelKind {
    pub const ALL: [ModelKind; 5] = [
        ModelKind::DataModel,
        ModelKind::QueryModel,
        ModelKind::CommandModel,
        ModelKind::StaticEnum,
        ModelKind::ValueObject,
    ];

    /// Name written in the discriminator of a root node.
    pub fn schema_name(self) -> &'static str {
        match self {
            ModelKind::DataModel => "data-model",
            ModelKind::QueryModel => "query-model",
            ModelKind::CommandModel => "command-model",
            ModelKind::StaticEnum => "enum",
            ModelKind::ValueObject => "value-object",
        }
    }

    /// Whether every row of this model needs a declared identity.
    pub fn requires_durable_identity(self) -> bool {
        matches!(self, ModelKind::DataModel)
    }

    /// Whether roots of this model are usable as value-member types.
    pub fn declares_value_type(self) -> bool {
        matches!(self, ModelKind::StaticEnum | ModelKind::ValueObject)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.schema_name())
    }
}

/// Inconsistencies in a [`SchemaParseRule`].
///
/// These describe a misconfigured compiler, not a bad document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// A model kind is enabled twice.
    #[error("duplicate model name: {0}")]
    DuplicateModel(String),
    /// Two value types share a schema name.
    #[error("duplicate value type name: {0}")]
    DuplicateValueType(String),
    /// A model and a value type share a schema name.
    #[error("name used by both a model and a value type: {0}")]
    ModelTypeCollision(String),
    /// Two options share an attribute name.
    #[error("duplicate option name: {0}")]
    DuplicateOption(String),
    /// An option uses the discriminator's attribute name.
    #[error("option cannot share the discriminator name: {0}")]
    OptionShadowsDiscriminator(String),
    /// A marker or the discriminator is empty.
    #[error("{0} cannot be empty")]
    EmptyMarker(&'static str),
    /// The nested-one and nested-many markers are equal.
    #[error("nested markers must differ: {0}")]
    AmbiguousMarkers(String),
}

/// Discriminator, markers and registries used to classify a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaParseRule {
    pub discriminator: String,
    pub child_marker: String,
    pub children_marker: String,
    pub ref_prefix: String,
    pub models: Vec<ModelKind>,
    pub value_types: Vec<ValueMemberType>,
    pub options: Vec<NodeOption>,
}

impl Default for SchemaParseRule {
    fn default() -> Self {
        Self {
            discriminator: DEFAULT_DISCRIMINATOR.to_string(),
            child_marker: DEFAULT_CHILD_MARKER.to_string(),
            children_marker: DEFAULT_CHILDREN_MARKER.to_string(),
            ref_prefix: DEFAULT_REF_PREFIX.to_string(),
            models: ModelKind::ALL.to_vec(),
            value_types: ValueMemberType::builtins(),
            options: NodeOption::ALL.to_vec(),
        }
    }
}

impl SchemaParseRule {
    /// Resolves a root discriminator against the enabled models.
    pub fn model(&self, name: &str) -> Option<ModelKind> {
        self.models
            .iter()
            .copied()
            .find(|m| m.schema_name() == name)
    }

    /// Comma-separated enabled model names, for diagnostics.
    pub fn model_names(&self) -> String {
        self.models
            .iter()
            .map(|m| m.schema_name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Resolves a discriminator against the builtin value types.
    pub fn builtin_value_type(&self, name: &str) -> Option<&ValueMemberType> {
        self.value_types.iter().find(|t| t.schema_name() == name)
    }

    /// Looks up a recognized option by attribute name.
    pub fn option(&self, key: &str) -> Option<NodeOption> {
        self.options.iter().copied().find(|o| o.key() == key)
    }

    /// Checks the rule for duplicate or colliding names.
    ///
    /// # Errors
    ///
    /// Returns the first [`RuleError`] found.
    pub fn ensure_consistent(&self) -> Result<(), RuleError> {
        for (label, value) in [
            ("discriminator", &self.discriminator),
            ("child marker", &self.child_marker),
            ("children marker", &self.children_marker),
            ("reference prefix", &self.ref_prefix),
        ] {
            if value.trim().is_empty() {
                return Err(RuleError::EmptyMarker(label));
            }
        }
        if self.child_marker == self.children_marker {
            return Err(RuleError::AmbiguousMarkers(self.child_marker.clone()));
        }

        let mut models = HashSet::new();
        for model in &self.models {
            if !models.insert(model.schema_name()) {
                return Err(RuleError::DuplicateModel(model.schema_name().to_string()));
            }
        }

        let mut types = HashSet::new();
        for value_type in &self.value_types {
            let name = value_type.schema_name();
            if !types.insert(name) {
                return Err(RuleError::DuplicateValueType(name.to_string()));
            }
            if models.contains(name) {
                return Err(RuleError::ModelTypeCollision(name.to_string()));
            }
        }

        let mut options = HashSet::new();
        for option in &self.options {
            if option.key() == self.discriminator {
                return Err(RuleError::OptionShadowsDiscriminator(option.key().to_string()));
            }
            if !options.insert(option.key()) {
                return Err(RuleError::DuplicateOption(option.key().to_string()));
            }
        }

        Ok(())
    }
}

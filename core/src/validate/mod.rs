//! Whole-document semantic validation.
//!
//! [`validate_document`] runs every check over the document and returns all
//! violations, grouped per offending node. Nothing stops at the first
//! error: a document with a naming, a structural and a reference problem
//! reports all three in one call.
//!
//! Stages run in a fixed order: naming, structure (classification and
//! per-kind shape rules), references, then attribute options. Each stage
//! classifies nodes itself, so a failure in one stage never hides the
//! findings of another.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use aggregate_schema_core::*;
//!
//! let mut b = SchemaDocument::builder("Schema");
//! let order = b.add_root("Order", [("Type", "data-model")]);
//! b.add_child(order, "Lines", [("Type", "children")]);
//! let ctx = Arc::new(SchemaParseContext::with_default_rule(b.build()).unwrap());
//!
//! let errors = validate_document(&ctx);
//! // Neither the root nor the nested-many aggregate declares a key.
//! assert_eq!(errors.len(), 2);
//! assert!(errors.to_string().contains("Order/Lines"));
//! ```

mod naming;
mod options;
mod reference;
mod structure;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::classify::NodeKind;
use crate::context::SchemaParseContext;
use crate::document::NodeId;
use crate::rule::ModelKind;

/// Broad kind of a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The discriminator does not resolve to any known kind.
    Classification,
    /// Root, sibling or storage-name collisions.
    Naming,
    /// A kind's own shape rules are violated.
    Structural,
    /// Missing target, self-containment, incompatibility or cycles.
    Reference,
    /// An option's value or placement is invalid.
    Attribute,
    /// A value member's type does not resolve.
    TypeResolution,
}

/// A single violation found in a schema document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No discriminator attribute on a node that needs one.
    #[error("missing {attribute} attribute")]
    MissingDiscriminator { attribute: String },
    /// A root names a model that is not enabled.
    #[error("unknown model '{name}', expected one of: {expected}")]
    UnknownModel { name: String, expected: String },
    /// A discriminator matches no marker, prefix or value type.
    #[error("type '{0}' is not a value type, enum or value object")]
    UnresolvedType(String),
    /// Two root-level nodes share a physical name.
    #[error("root-level name '{0}' is already used")]
    DuplicateRootName(String),
    /// Two children of one node share a physical name.
    #[error("name '{0}' is already used by a sibling")]
    DuplicateSiblingName(String),
    /// A storage name is reused by a different node.
    #[error("storage name '{0}' is already used")]
    DuplicateStorageName(String),
    /// An aggregate needs at least one key and declares none.
    #[error("at least one key member is required")]
    MissingKey,
    /// An aggregate declares a key where none is allowed.
    #[error("key member '{0}' is not allowed here")]
    ForbiddenKey(String),
    /// A node sits under a parent that cannot own it.
    #[error("a {kind} cannot be placed under {parent}")]
    InvalidNesting { kind: NodeKind, parent: String },
    /// A leaf node has child nodes.
    #[error("a {0} cannot have child nodes")]
    LeafWithChildren(NodeKind),
    /// An enum root declares no values.
    #[error("an enum must declare at least one value")]
    EmptyEnum,
    /// An enum value carries a discriminator.
    #[error("an enum value cannot have a type")]
    EnumValueWithType,
    /// A reference discriminator has nothing after the prefix.
    #[error("reference target is empty")]
    MissingReferenceTarget,
    /// No node matches the reference target path.
    #[error("reference target '{0}' does not exist")]
    ReferenceTargetNotFound(String),
    /// The reference target is not an aggregate.
    #[error("reference target '{0}' is not an aggregate")]
    ReferenceTargetNotAggregate(String),
    /// The reference target lies within the referencing root's own tree.
    #[error("reference target '{0}' is inside the referencing aggregate's own tree")]
    SelfReference(String),
    /// The source model may not reference the target model.
    #[error("a {from} cannot reference a {to}")]
    IncompatibleReference { from: ModelKind, to: ModelKind },
    /// The target is neither a query model nor a data model with a default
    /// query model.
    #[error("reference target '{0}' must be a query model or a data model with GenerateDefaultQueryModel")]
    NotReadProjection(String),
    /// Query-model references loop back to the referencing root.
    #[error("reference to '{0}' creates a reference cycle")]
    ReferenceCycle(String),
    /// A command-model reference does not say which role it plays.
    #[error("references in a command model must set RefToObject")]
    MissingRefToObject,
    /// An attribute that is not a recognized option.
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    /// A recognized option placed where it is not available.
    #[error("option '{option}' is available {reason}")]
    OptionNotAvailable { option: String, reason: String },
    /// An option's value fails its validator.
    #[error("invalid value for '{option}': {reason}")]
    InvalidOptionValue { option: String, reason: String },
    /// An option that depends on another option set alongside it.
    #[error("'{option}' requires '{required}'")]
    OptionRequires { option: String, required: String },
    /// A type-specific option on a type that does not use it.
    #[error("'{option}' does not apply to type '{value_type}'")]
    OptionNotApplicableToType { option: String, value_type: String },
    /// More decimal places than total digits.
    #[error("decimal places ({places}) exceed total digits ({total})")]
    DecimalPlaceExceedsTotal { places: u32, total: u32 },
    /// Two enum values share a key.
    #[error("enum key '{0}' is already used")]
    DuplicateEnumKey(i64),
}

impl ValidationError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ValidationError::MissingDiscriminator { .. } | ValidationError::UnknownModel { .. } => {
                ErrorCategory::Classification
            }
            ValidationError::UnresolvedType(_) => ErrorCategory::TypeResolution,
            ValidationError::DuplicateRootName(_)
            | ValidationError::DuplicateSiblingName(_)
            | ValidationError::DuplicateStorageName(_) => ErrorCategory::Naming,
            ValidationError::MissingKey
            | ValidationError::ForbiddenKey(_)
            | ValidationError::InvalidNesting { .. }
            | ValidationError::LeafWithChildren(_)
            | ValidationError::EmptyEnum
            | ValidationError::EnumValueWithType => ErrorCategory::Structural,
            ValidationError::MissingReferenceTarget
            | ValidationError::ReferenceTargetNotFound(_)
            | ValidationError::ReferenceTargetNotAggregate(_)
            | ValidationError::SelfReference(_)
            | ValidationError::IncompatibleReference { .. }
            | ValidationError::NotReadProjection(_)
            | ValidationError::ReferenceCycle(_)
            | ValidationError::MissingRefToObject => ErrorCategory::Reference,
            ValidationError::UnknownOption(_)
            | ValidationError::OptionNotAvailable { .. }
            | ValidationError::InvalidOptionValue { .. }
            | ValidationError::OptionRequires { .. }
            | ValidationError::OptionNotApplicableToType { .. }
            | ValidationError::DecimalPlaceExceedsTotal { .. }
            | ValidationError::DuplicateEnumKey(_) => ErrorCategory::Attribute,
        }
    }
}

/// Errors recorded against one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeErrors {
    pub node: NodeId,
    /// Structural path of the node (`Order/Lines`).
    pub path: String,
    /// Errors about the node as a whole.
    pub errors: Vec<ValidationError>,
    /// Errors about individual attributes, by attribute name.
    pub attribute_errors: BTreeMap<String, Vec<ValidationError>>,
}

impl NodeErrors {
    /// Every error of this node, whole-node errors first.
    pub fn all(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors
            .iter()
            .chain(self.attribute_errors.values().flatten())
    }

    pub fn len(&self) -> usize {
        self.all().count()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.attribute_errors.values().all(Vec::is_empty)
    }
}

/// Every validation error of a document, grouped per node in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaErrors {
    nodes: Vec<NodeErrors>,
}

impl SchemaErrors {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of errors across all nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().map(NodeErrors::len).sum()
    }

    pub fn nodes(&self) -> &[NodeErrors] {
        &self.nodes
    }

    pub fn for_node(&self, id: NodeId) -> Option<&NodeErrors> {
        self.nodes.iter().find(|n| n.node == id)
    }

    /// Every error, flattened.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.nodes.iter().flat_map(NodeErrors::all)
    }

    /// Number of errors per category.
    pub fn count_by_category(&self) -> HashMap<ErrorCategory, usize> {
        let mut counts = HashMap::new();
        for error in self.iter() {
            *counts.entry(error.category()).or_insert(0) += 1;
        }
        counts
    }

    /// Serializable view for reports.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            nodes: self
                .nodes
                .iter()
                .map(|n| NodeReport {
                    path: n.path.clone(),
                    errors: n.errors.iter().map(ReportedError::from).collect(),
                    attributes: n
                        .attribute_errors
                        .iter()
                        .map(|(attr, errors)| {
                            (attr.clone(), errors.iter().map(ReportedError::from).collect())
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl fmt::Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", node.path)?;
            for error in &node.errors {
                write!(f, "\n  - {error}")?;
            }
            for (attr, errors) in &node.attribute_errors {
                for error in errors {
                    write!(f, "\n  - {attr}: {error}")?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for SchemaErrors {}

/// JSON-friendly rendering of [`SchemaErrors`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub nodes: Vec<NodeReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeReport {
    pub path: String,
    pub errors: Vec<ReportedError>,
    pub attributes: BTreeMap<String, Vec<ReportedError>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedError {
    pub category: ErrorCategory,
    pub message: String,
}

impl From<&ValidationError> for ReportedError {
    fn from(error: &ValidationError) -> Self {
        Self {
            category: error.category(),
            message: error.to_string(),
        }
    }
}

/// Accumulates findings while the stages run.
pub(crate) struct Findings<'a> {
    ctx: &'a SchemaParseContext,
    by_node: HashMap<NodeId, NodeErrors>,
}

impl<'a> Findings<'a> {
    fn new(ctx: &'a SchemaParseContext) -> Self {
        Self {
            ctx,
            by_node: HashMap::new(),
        }
    }

    fn entry(&mut self, id: NodeId) -> &mut NodeErrors {
        let ctx = self.ctx;
        self.by_node.entry(id).or_insert_with(|| NodeErrors {
            node: id,
            path: ctx.document().path(id),
            errors: Vec::new(),
            attribute_errors: BTreeMap::new(),
        })
    }

    /// Records an error against the node as a whole.
    pub(crate) fn node(&mut self, id: NodeId, error: ValidationError) {
        self.entry(id).errors.push(error);
    }

    /// Records an error against one attribute of the node.
    pub(crate) fn attribute(&mut self, id: NodeId, attribute: &str, error: ValidationError) {
        self.entry(id)
            .attribute_errors
            .entry(attribute.to_string())
            .or_default()
            .push(error);
    }

    fn count(&self) -> usize {
        self.by_node.values().map(NodeErrors::len).sum()
    }

    fn finish(mut self) -> SchemaErrors {
        let nodes = self
            .ctx
            .document()
            .iter()
            .filter_map(|id| self.by_node.remove(&id))
            .collect();
        SchemaErrors { nodes }
    }
}

/// Validates the whole document and returns every violation found.
///
/// An empty result means the document is usable.
pub fn validate_document(ctx: &Arc<SchemaParseContext>) -> SchemaErrors {
    let mut findings = Findings::new(ctx);

    naming::check(ctx, &mut findings);
    debug!(stage = "naming", errors = findings.count(), "Validation stage finished");
    structure::check(ctx, &mut findings);
    debug!(stage = "structure", errors = findings.count(), "Validation stage finished");
    reference::check(ctx, &mut findings);
    debug!(stage = "reference", errors = findings.count(), "Validation stage finished");
    options::check(ctx, &mut findings);
    debug!(stage = "options", errors = findings.count(), "Validation stage finished");

    findings.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SchemaDocument;

    fn context(build: impl FnOnce(&mut crate::DocumentBuilder)) -> Arc<SchemaParseContext> {
        let mut b = SchemaDocument::builder("Schema");
        build(&mut b);
        Arc::new(SchemaParseContext::with_default_rule(b.build()).unwrap())
    }

    #[test]
    fn test_valid_document_has_no_errors() {
        let ctx = context(|b| {
            let order = b.add_root("Order", [("Type", "data-model")]);
            b.add_child(order, "No", [("Type", "int"), ("IsKey", "True")]);
        });
        let errors = validate_document(&ctx);
        assert!(errors.is_empty(), "{errors}");
        assert_eq!(errors.len(), 0);
    }

    #[test]
    fn test_errors_grouped_in_document_order() {
        let ctx = context(|b| {
            let a = b.add_root("A", [("Type", "data-model")]);
            b.add_child(a, "X", [("Type", "bogus")]);
            b.add_root("B", [("Type", "nope")]);
        });
        let errors = validate_document(&ctx);
        let paths: Vec<&str> = errors.nodes().iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["A", "A/X", "B"]);
    }

    #[test]
    fn test_display_format() {
        let ctx = context(|b| {
            let a = b.add_root("A", [("Type", "data-model")]);
            b.add_child(a, "Id", [("Type", "word"), ("IsKey", "yes")]);
        });
        let errors = validate_document(&ctx);
        let rendered = errors.to_string();
        assert!(rendered.contains("A\n  - at least one key member is required"), "{rendered}");
        assert!(
            rendered.contains("A/Id\n  - IsKey: invalid value for 'IsKey': expected True or False"),
            "{rendered}"
        );
    }

    #[test]
    fn test_attribute_errors_are_separate() {
        let ctx = context(|b| {
            let a = b.add_root("A", [("Type", "data-model")]);
            b.add_child(a, "Id", [("Type", "word"), ("IsKey", "True"), ("MaxLength", "ten")]);
        });
        let errors = validate_document(&ctx);
        let id = ctx.document().find_path(&["A", "Id"]).unwrap();
        let node = errors.for_node(id).unwrap();
        assert!(node.errors.is_empty());
        assert_eq!(node.attribute_errors["MaxLength"].len(), 1);
        assert_eq!(
            node.attribute_errors["MaxLength"][0].category(),
            ErrorCategory::Attribute
        );
    }

    #[test]
    fn test_report_serializes() {
        let ctx = context(|b| {
            b.add_root("A", [("Type", "data-model")]);
        });
        let report = validate_document(&ctx).report();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["nodes"][0]["path"], "A");
        assert_eq!(json["nodes"][0]["errors"][0]["category"], "structural");
    }

    #[test]
    fn test_count_by_category() {
        let ctx = context(|b| {
            let a = b.add_root("A", [("Type", "data-model")]);
            b.add_child(a, "X", [("Type", "bogus")]);
            b.add_root("A", [("Type", "data-model")]);
        });
        let counts = validate_document(&ctx).count_by_category();
        assert_eq!(counts[&ErrorCategory::Naming], 1);
        assert_eq!(counts[&ErrorCategory::TypeResolution], 1);
        assert_eq!(counts[&ErrorCategory::Structural], 2);
    }
}

//! Per-document parse context.
//!
//! [`SchemaParseContext`] pairs a document snapshot with the rule used to
//! read it and the lookup tables derived from the document once, up front:
//! which roots declare enumeration / value-object types, and which nested
//! structural names are shared by more than one nested aggregate.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::debug;

use crate::classify::{NodeKind, classify};
use crate::document::{NodeId, SchemaDocument};
use crate::rule::{ModelKind, RuleError, SchemaParseRule};
use crate::value_type::ValueMemberType;

/// Immutable context shared by every graph object built over one document.
#[derive(Debug)]
pub struct SchemaParseContext {
    document: Arc<SchemaDocument>,
    rule: SchemaParseRule,
    declared_types: BTreeMap<String, ValueMemberType>,
    nested_name_counts: HashMap<String, usize>,
}

impl SchemaParseContext {
    /// Builds the context and its lookup tables.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleError`] if `rule` is inconsistent.
    pub fn new(document: Arc<SchemaDocument>, rule: SchemaParseRule) -> Result<Self, RuleError> {
        rule.ensure_consistent()?;

        let mut declared_types = BTreeMap::new();
        for root in document.top_level() {
            let name = document.node_name(*root);
            let Some(model) = document
                .attribute(*root, &rule.discriminator)
                .and_then(|d| rule.model(d))
            else {
                continue;
            };
            let value_type = match model {
                ModelKind::StaticEnum => ValueMemberType::StaticEnum(name.to_string()),
                ModelKind::ValueObject => ValueMemberType::ValueObject(name.to_string()),
                _ => continue,
            };
            declared_types.entry(name.to_string()).or_insert(value_type);
        }

        let mut nested_name_counts: HashMap<String, usize> = HashMap::new();
        for id in document.iter() {
            if document.is_top_level(id) {
                continue;
            }
            let discriminator = document.attribute(id, &rule.discriminator);
            if discriminator == Some(rule.child_marker.as_str())
                || discriminator == Some(rule.children_marker.as_str())
            {
                *nested_name_counts
                    .entry(document.node_name(id).to_string())
                    .or_default() += 1;
            }
        }

        debug!(
            nodes = document.len(),
            declared_types = declared_types.len(),
            "Built schema parse context"
        );

        Ok(Self {
            document,
            rule,
            declared_types,
            nested_name_counts,
        })
    }

    /// Builds a context with the default rule.
    pub fn with_default_rule(document: SchemaDocument) -> Result<Self, RuleError> {
        Self::new(Arc::new(document), SchemaParseRule::default())
    }

    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    pub fn rule(&self) -> &SchemaParseRule {
        &self.rule
    }

    /// Raw discriminator value of `id`.
    pub fn discriminator(&self, id: NodeId) -> Option<&str> {
        self.document.attribute(id, &self.rule.discriminator)
    }

    /// Classifies `id`. See [`classify`].
    pub fn kind(&self, id: NodeId) -> NodeKind {
        classify(self, id)
    }

    /// Model declared by the root-level ancestor of `id`, if it resolves.
    pub fn model_of(&self, id: NodeId) -> Option<ModelKind> {
        let root = self.document.root_of(id);
        self.discriminator(root).and_then(|d| self.rule.model(d))
    }

    /// Resolves a discriminator against builtin and document-declared types.
    pub fn resolve_value_type(&self, discriminator: &str) -> Option<ValueMemberType> {
        self.rule
            .builtin_value_type(discriminator)
            .cloned()
            .or_else(|| self.declared_types.get(discriminator).cloned())
    }

    /// Types declared by `enum` and `value-object` roots, by name.
    pub fn declared_types(&self) -> &BTreeMap<String, ValueMemberType> {
        &self.declared_types
    }

    /// Target path segments written after the reference prefix, if `id`
    /// carries a reference discriminator.
    pub fn reference_path(&self, id: NodeId) -> Option<Vec<&str>> {
        let raw = self.discriminator(id)?.strip_prefix(self.rule.ref_prefix.as_str())?;
        Some(raw.split('/').filter(|s| !s.trim().is_empty()).collect())
    }

    /// Resolves the raw node a reference points at.
    ///
    /// Among several structural matches the first aggregate wins, so a
    /// reference member named like its target does not resolve to itself.
    pub fn resolve_reference(&self, id: NodeId) -> Option<NodeId> {
        let segments = self.reference_path(id)?;
        let matches = self.document.find_paths(&segments);
        matches
            .iter()
            .copied()
            .find(|m| self.kind(*m).is_aggregate())
            .or_else(|| matches.first().copied())
    }

    /// Whether more than one nested aggregate uses the structural `name`.
    pub(crate) fn is_shared_nested_name(&self, name: &str) -> bool {
        self.nested_name_counts.get(name).copied().unwrap_or(0) >= 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> (SchemaParseContext, NodeId, NodeId) {
        let mut b = SchemaDocument::builder("Schema");
        b.add_root("Status", [("Type", "enum")]);
        b.add_root("Code", [("Type", "value-object")]);
        let order = b.add_root("Order", [("Type", "data-model")]);
        let lines = b.add_child(order, "Lines", [("Type", "children")]);
        let customer = b.add_child(order, "Customer", [("Type", "ref-to:Customer")]);
        let invoice = b.add_root("Invoice", [("Type", "data-model")]);
        b.add_child(invoice, "Lines", [("Type", "children")]);
        b.add_root("Customer", [("Type", "data-model")]);
        let ctx = SchemaParseContext::with_default_rule(b.build()).unwrap();
        (ctx, lines, customer)
    }

    #[test]
    fn test_declared_types() {
        let (ctx, ..) = context();
        assert_eq!(
            ctx.resolve_value_type("Status"),
            Some(ValueMemberType::StaticEnum("Status".into()))
        );
        assert_eq!(
            ctx.resolve_value_type("Code"),
            Some(ValueMemberType::ValueObject("Code".into()))
        );
        assert_eq!(ctx.resolve_value_type("word"), Some(ValueMemberType::Word));
        assert_eq!(ctx.resolve_value_type("Order"), None);
    }

    #[test]
    fn test_shared_nested_names() {
        let (ctx, ..) = context();
        assert!(ctx.is_shared_nested_name("Lines"));
        assert!(!ctx.is_shared_nested_name("Customer"));
    }

    #[test]
    fn test_reference_resolution() {
        let (ctx, lines, customer) = context();
        let target = ctx.resolve_reference(customer).unwrap();
        assert_eq!(ctx.document().node_name(target), "Customer");
        assert!(ctx.document().is_top_level(target));
        assert_eq!(ctx.resolve_reference(lines), None);
        assert_eq!(ctx.model_of(lines), Some(ModelKind::DataModel));
    }

    #[test]
    fn test_inconsistent_rule_is_rejected() {
        let rule = SchemaParseRule {
            discriminator: String::new(),
            ..SchemaParseRule::default()
        };
        let doc = SchemaDocument::builder("Schema").build();
        assert!(SchemaParseContext::new(Arc::new(doc), rule).is_err());
    }
}

//! Node classification.
//!
//! Determines the schema role of a raw node from its structural position
//! and its discriminator attribute. Position is checked before content: a
//! root-level node is always a [`NodeKind::Root`], however malformed its
//! discriminator, so that the model validator can report the precise
//! problem.
//!
//! # Examples
//!
//! ```
//! use aggregate_schema_core::{NodeKind, SchemaDocument, SchemaParseContext};
//!
//! let mut b = SchemaDocument::builder("Schema");
//! let order = b.add_root("Order", [("Type", "no-such-model")]);
//! let lines = b.add_child(order, "Lines", [("Type", "children")]);
//! let note = b.add_child(order, "Note", [("Type", "description")]);
//! let ctx = SchemaParseContext::with_default_rule(b.build()).unwrap();
//!
//! assert_eq!(ctx.kind(order), NodeKind::Root);
//! assert_eq!(ctx.kind(lines), NodeKind::NestedMany);
//! assert_eq!(ctx.kind(note), NodeKind::ValueMember);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::SchemaParseContext;
use crate::document::NodeId;
use crate::rule::ModelKind;

/// Schema role of a raw node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Root-level aggregate.
    Root,
    /// Nested aggregate with one-to-one multiplicity.
    NestedOne,
    /// Nested aggregate with one-to-many multiplicity.
    NestedMany,
    /// Member of an enumeration definition.
    EnumValue,
    /// Reference to another aggregate.
    Reference,
    /// Leaf scalar attribute.
    ValueMember,
    /// Nothing matched; always reported by the validator.
    Unknown,
}

impl NodeKind {
    pub fn is_aggregate(self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::NestedOne | NodeKind::NestedMany)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Root => "root aggregate",
            NodeKind::NestedOne => "nested-one aggregate",
            NodeKind::NestedMany => "nested-many aggregate",
            NodeKind::EnumValue => "enum value",
            NodeKind::Reference => "reference",
            NodeKind::ValueMember => "value member",
            NodeKind::Unknown => "unknown node",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies `id`.
///
/// The checks run in a fixed order: structural root, nested markers,
/// enumeration membership, reference prefix, value-type resolution.
/// The result depends only on the raw document, never on how the node was
/// reached.
pub fn classify(ctx: &SchemaParseContext, id: NodeId) -> NodeKind {
    let doc = ctx.document();
    let rule = ctx.rule();

    let Some(parent) = doc.parent(id) else {
        return NodeKind::Root;
    };

    let discriminator = ctx.discriminator(id);
    if discriminator == Some(rule.child_marker.as_str()) {
        return NodeKind::NestedOne;
    }
    if discriminator == Some(rule.children_marker.as_str()) {
        return NodeKind::NestedMany;
    }

    if doc.is_top_level(parent)
        && ctx.discriminator(parent).and_then(|d| rule.model(d)) == Some(ModelKind::StaticEnum)
    {
        return NodeKind::EnumValue;
    }

    let Some(discriminator) = discriminator else {
        return NodeKind::Unknown;
    };
    if discriminator.starts_with(rule.ref_prefix.as_str()) {
        return NodeKind::Reference;
    }
    if ctx.resolve_value_type(discriminator).is_some() {
        return NodeKind::ValueMember;
    }

    NodeKind::Unknown
}

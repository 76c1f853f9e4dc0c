//! Aggregate graph over a parsed schema document.
//!
//! Every graph object is an immutable view of one raw node plus the object
//! it was reached from (its *previous* node). Navigation never mutates the
//! document; it builds new views that remember their arrival path.
//!
//! Navigating back to the node an object was reached from returns that
//! very object instead of building a new one (*path rewind*):
//!
//! ```
//! use std::sync::Arc;
//! use aggregate_schema_core::{Aggregate, Member, SchemaDocument, SchemaParseContext};
//!
//! let mut b = SchemaDocument::builder("Schema");
//! let order = b.add_root("Order", [("Type", "data-model")]);
//! b.add_child(order, "Id", [("Type", "word"), ("IsKey", "True")]);
//! let lines = b.add_child(order, "Lines", [("Type", "children")]);
//! b.add_child(lines, "No", [("Type", "int"), ("IsKey", "True")]);
//! let ctx = Arc::new(SchemaParseContext::with_default_rule(b.build()).unwrap());
//!
//! let root = Aggregate::entry(&ctx, order).unwrap();
//! let child = root
//!     .members()
//!     .into_iter()
//!     .find_map(|m| match m {
//!         Member::NestedMany(a) => Some(a),
//!         _ => None,
//!     })
//!     .unwrap();
//! let back = child.parent().unwrap();
//! assert_eq!(back, root);
//! assert!(back.node().ptr_eq(root.node()));
//! ```

mod aggregate;
mod member;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub use aggregate::{Aggregate, AggregateKind};
pub use member::{EnumValue, Member, RefMember, ValueMember};

use crate::classify::NodeKind;
use crate::context::SchemaParseContext;
use crate::document::NodeId;
use crate::identity::SchemaNodeIdentity;
use crate::naming;
use crate::options::{NodeOption, parse_flag};
use crate::rule::ModelKind;

struct PathNode {
    ctx: Arc<SchemaParseContext>,
    id: NodeId,
    previous: Option<SchemaNode>,
}

/// A raw node viewed through the path that reached it.
///
/// Equality and hashing use the underlying raw node only, so two views of
/// the same node compare equal whatever their arrival paths.
#[derive(Clone)]
pub struct SchemaNode(Arc<PathNode>);

impl SchemaNode {
    /// A view with no arrival path.
    pub fn entry(ctx: Arc<SchemaParseContext>, id: NodeId) -> Self {
        Self(Arc::new(PathNode {
            ctx,
            id,
            previous: None,
        }))
    }

    fn arrived(ctx: Arc<SchemaParseContext>, id: NodeId, previous: SchemaNode) -> Self {
        Self(Arc::new(PathNode {
            ctx,
            id,
            previous: Some(previous),
        }))
    }

    /// Moves to `target`, rewinding to the previous node when `target` is
    /// the node this view was reached from.
    pub(crate) fn step(&self, target: NodeId) -> SchemaNode {
        match &self.0.previous {
            Some(previous) if previous.id() == target => previous.clone(),
            _ => SchemaNode::arrived(self.0.ctx.clone(), target, self.clone()),
        }
    }

    pub fn id(&self) -> NodeId {
        self.0.id
    }

    pub fn context(&self) -> &Arc<SchemaParseContext> {
        &self.0.ctx
    }

    /// The view this one was reached from.
    pub fn previous(&self) -> Option<&SchemaNode> {
        self.0.previous.as_ref()
    }

    /// The arrival path, nearest first.
    pub fn previous_nodes(&self) -> impl Iterator<Item = &SchemaNode> {
        std::iter::successors(self.previous(), |node| node.previous())
    }

    /// Whether both views are the same object, not merely the same node.
    pub fn ptr_eq(&self, other: &SchemaNode) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn kind(&self) -> NodeKind {
        self.0.ctx.kind(self.0.id)
    }

    pub fn model(&self) -> Option<ModelKind> {
        self.0.ctx.model_of(self.0.id)
    }

    pub fn name(&self) -> &str {
        self.0.ctx.document().node_name(self.0.id)
    }

    pub fn physical_name(&self) -> String {
        naming::physical_name(&self.0.ctx, self.0.id)
    }

    pub fn display_name(&self) -> String {
        naming::display_name(&self.0.ctx, self.0.id)
    }

    pub fn storage_name(&self) -> String {
        naming::storage_name(&self.0.ctx, self.0.id)
    }

    pub fn latin_name(&self) -> String {
        naming::latin_name(&self.0.ctx, self.0.id)
    }

    /// Structural path (`Order/Lines/No`).
    pub fn path(&self) -> String {
        self.0.ctx.document().path(self.0.id)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.0.ctx.document().attribute(self.0.id, key)
    }

    /// Whether a flag option is present and set.
    pub fn flag(&self, option: NodeOption) -> bool {
        self.attribute(option.key())
            .and_then(parse_flag)
            .unwrap_or(false)
    }

    pub fn identity(&self) -> SchemaNodeIdentity {
        SchemaNodeIdentity::of(self)
    }

    /// The aggregate a reference node points at, reached through it.
    ///
    /// Returns `None` when the target does not exist or is not an aggregate.
    ///
    /// # Panics
    ///
    /// Panics if this node is not a reference.
    pub fn ref_target(&self) -> Option<Aggregate> {
        assert_eq!(
            self.kind(),
            NodeKind::Reference,
            "{} is not a reference",
            self.path()
        );
        let target = self.0.ctx.resolve_reference(self.0.id)?;
        Aggregate::from_node(self.step(target))
    }

    pub fn to_aggregate(&self) -> Option<Aggregate> {
        Aggregate::from_node(self.clone())
    }

    pub fn to_member(&self) -> Option<Member> {
        Member::from_node(self.clone())
    }
}

impl PartialEq for SchemaNode {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for SchemaNode {}

impl Hash for SchemaNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaNode")
            .field("path", &self.path())
            .field("kind", &self.kind())
            .field(
                "previous",
                &self.previous_nodes().map(|n| n.name().to_string()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

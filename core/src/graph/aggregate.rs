use std::collections::HashSet;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{Member, RefMember, SchemaNode, ValueMember};
use crate::classify::NodeKind;
use crate::context::SchemaParseContext;
use crate::document::NodeId;

/// Variant of an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateKind {
    Root,
    NestedOne,
    NestedMany,
}

/// A root, nested-one or nested-many aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Aggregate {
    node: SchemaNode,
    kind: AggregateKind,
}

impl Aggregate {
    /// Views `id` as an aggregate with no arrival path.
    ///
    /// Returns `None` if `id` is not classified as an aggregate.
    pub fn entry(ctx: &Arc<SchemaParseContext>, id: NodeId) -> Option<Self> {
        Self::from_node(SchemaNode::entry(ctx.clone(), id))
    }

    pub(crate) fn from_node(node: SchemaNode) -> Option<Self> {
        let kind = match node.kind() {
            NodeKind::Root => AggregateKind::Root,
            NodeKind::NestedOne => AggregateKind::NestedOne,
            NodeKind::NestedMany => AggregateKind::NestedMany,
            _ => return None,
        };
        Some(Self { node, kind })
    }

    pub fn node(&self) -> &SchemaNode {
        &self.node
    }

    pub fn kind(&self) -> AggregateKind {
        self.kind
    }

    pub fn is_root(&self) -> bool {
        self.kind == AggregateKind::Root
    }

    /// Direct members in document order. Unclassifiable children are
    /// skipped; the validator reports them.
    pub fn members(&self) -> Vec<Member> {
        self.node
            .context()
            .document()
            .children(self.node.id())
            .iter()
            .filter_map(|child| Member::from_node(self.node.step(*child)))
            .collect()
    }

    /// The owning aggregate; `None` for roots.
    pub fn parent(&self) -> Option<Aggregate> {
        if self.is_root() {
            return None;
        }
        let parent = self.node.context().document().parent(self.node.id())?;
        Aggregate::from_node(self.node.step(parent))
    }

    /// Owning aggregates, root first.
    pub fn ancestors(&self) -> Vec<Aggregate> {
        let mut ancestors: Vec<Aggregate> =
            std::iter::successors(self.parent(), |a| a.parent()).collect();
        ancestors.reverse();
        ancestors
    }

    pub fn root(&self) -> Aggregate {
        self.ancestors()
            .into_iter()
            .next()
            .unwrap_or_else(|| self.clone())
    }

    /// Ancestors followed by this aggregate.
    pub fn path_from_root(&self) -> Vec<Aggregate> {
        let mut path = self.ancestors();
        path.push(self.clone());
        path
    }

    /// Nested aggregates below this one, depth-first pre-order.
    pub fn descendants(&self) -> Vec<Aggregate> {
        let mut out = Vec::new();
        self.collect_descendants(&mut out);
        out
    }

    /// This aggregate followed by its descendants.
    pub fn this_and_descendants(&self) -> Vec<Aggregate> {
        let mut out = vec![self.clone()];
        self.collect_descendants(&mut out);
        out
    }

    fn collect_descendants(&self, out: &mut Vec<Aggregate>) {
        for member in self.members() {
            if let Member::NestedOne(child) | Member::NestedMany(child) = member {
                out.push(child.clone());
                child.collect_descendants(out);
            }
        }
    }

    pub fn is_parent_of(&self, other: &Aggregate) -> bool {
        other.parent().is_some_and(|p| p == *self)
    }

    pub fn is_child_of(&self, other: &Aggregate) -> bool {
        other.is_parent_of(self)
    }

    pub fn is_ancestor_of(&self, other: &Aggregate) -> bool {
        other.ancestors().contains(self)
    }

    pub fn is_descendant_of(&self, other: &Aggregate) -> bool {
        other.is_ancestor_of(self)
    }

    /// Members flagged `IsKey` on this aggregate itself.
    pub fn own_keys(&self) -> Vec<Member> {
        self.members().into_iter().filter(|m| m.is_key()).collect()
    }

    /// Value members forming this aggregate's identity: the parent chain's
    /// keys first, then the own keys, with reference keys expanded into the
    /// target's key value members.
    pub fn key_value_members(&self) -> Vec<ValueMember> {
        let mut visiting = HashSet::new();
        let mut out = Vec::new();
        self.collect_key_value_members(&mut visiting, &mut out);
        out
    }

    fn collect_key_value_members(&self, visiting: &mut HashSet<NodeId>, out: &mut Vec<ValueMember>) {
        // A key reference chain that loops back is a schema error reported
        // elsewhere; stop expanding instead of recursing forever.
        if !visiting.insert(self.node.id()) {
            return;
        }
        if let Some(parent) = self.parent() {
            parent.collect_key_value_members(visiting, out);
        }
        for key in self.own_keys() {
            match key {
                Member::Value(vm) => out.push(vm),
                Member::Reference(rm) => {
                    if let Some(target) = rm.target() {
                        target.collect_key_value_members(visiting, out);
                    }
                }
                _ => {}
            }
        }
        visiting.remove(&self.node.id());
    }

    /// Whether `other`'s sole own key is a reference to this aggregate.
    ///
    /// Always `false` when `other` is nested-many, since it also carries the
    /// parent's key components.
    pub fn is_single_key_of(&self, other: &Aggregate) -> bool {
        if other.kind == AggregateKind::NestedMany {
            return false;
        }
        match other.own_keys().as_slice() {
            [Member::Reference(rm)] => rm.target().is_some_and(|t| t == *self),
            _ => false,
        }
    }

    /// References anywhere in the document that target this aggregate,
    /// each reached from this aggregate.
    pub fn ref_froms(&self) -> Vec<RefMember> {
        let ctx = self.node.context();
        ctx.document()
            .iter()
            .filter(|id| ctx.kind(*id) == NodeKind::Reference)
            .filter(|id| ctx.resolve_reference(*id) == Some(self.node.id()))
            .map(|id| RefMember::new(self.node.step(id)))
            .collect()
    }

    /// The same aggregate with its arrival path dropped.
    pub fn as_entry(&self) -> Aggregate {
        Aggregate {
            node: SchemaNode::entry(self.node.context().clone(), self.node.id()),
            kind: self.kind,
        }
    }

    /// Discriminator a reference to this aggregate would carry.
    pub fn ref_entry_name(&self) -> String {
        format!(
            "{}{}",
            self.node.context().rule().ref_prefix,
            self.node.path()
        )
    }
}

impl Deref for Aggregate {
    type Target = SchemaNode;

    fn deref(&self) -> &SchemaNode {
        &self.node
    }
}

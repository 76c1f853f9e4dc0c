//! Path-sensitive node identities.
//!
//! The same raw attribute reached through two different references must be
//! told apart when generating mapping code: "primary contact's name" and
//! "secondary contact's name" are distinct slots even though both are the
//! `Name` node of the same `Person` aggregate. A [`SchemaNodeIdentity`]
//! therefore combines the reference hops crossed on the way to a node with
//! the node itself.
//!
//! Identities are computed on demand and never cached.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::NodeKind;
use crate::document::NodeId;
use crate::graph::SchemaNode;

/// Hashable, comparable identity of a node reached along a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaNodeIdentity {
    hops: Vec<NodeId>,
    terminal: NodeId,
}

impl SchemaNodeIdentity {
    /// Computes the identity of `node` from its arrival path.
    ///
    /// Every reference followed to its target on the way to `node` is a
    /// hop, outermost first. A reference walked the other way (from a
    /// target through [`ref_froms`](crate::Aggregate::ref_froms) to the
    /// referring aggregate) is not. The node itself is the terminal, even
    /// when it is a reference.
    pub fn of(node: &SchemaNode) -> Self {
        let ctx = node.context();
        let mut hops = Vec::new();
        let mut next = node;
        for previous in node.previous_nodes() {
            if previous.kind() == NodeKind::Reference
                && ctx.resolve_reference(previous.id()) == Some(next.id())
            {
                hops.push(previous.id());
            }
            next = previous;
        }
        hops.reverse();
        Self {
            hops,
            terminal: node.id(),
        }
    }

    pub fn hops(&self) -> &[NodeId] {
        &self.hops
    }

    pub fn terminal(&self) -> NodeId {
        self.terminal
    }
}

impl fmt::Display for SchemaNodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for hop in &self.hops {
            write!(f, "{}>", hop.index())?;
        }
        write!(f, "{}", self.terminal.index())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;
    use crate::{Aggregate, Member, SchemaDocument, SchemaParseContext};

    fn contacts() -> (Arc<SchemaParseContext>, NodeId, NodeId) {
        let mut b = SchemaDocument::builder("Schema");
        let person = b.add_root("Person", [("Type", "data-model")]);
        let name = b.add_child(person, "Name", [("Type", "word"), ("IsKey", "True")]);
        let deal = b.add_root("Deal", [("Type", "data-model")]);
        b.add_child(deal, "No", [("Type", "int"), ("IsKey", "True")]);
        b.add_child(deal, "Primary", [("Type", "ref-to:Person")]);
        b.add_child(deal, "Secondary", [("Type", "ref-to:Person")]);
        let ctx = Arc::new(SchemaParseContext::with_default_rule(b.build()).unwrap());
        (ctx, deal, name)
    }

    fn name_via(deal: &Aggregate, reference: &str) -> SchemaNode {
        let members = deal.members();
        let Some(Member::Reference(rm)) = members.iter().find(|m| m.name() == reference) else {
            panic!("missing reference {reference}");
        };
        let person = rm.target().unwrap();
        person.members()[0].node().clone()
    }

    #[test]
    fn test_reference_aliasing() {
        let (ctx, deal, name) = contacts();
        let deal = Aggregate::entry(&ctx, deal).unwrap();

        let via_primary = name_via(&deal, "Primary").identity();
        let via_secondary = name_via(&deal, "Secondary").identity();
        let direct = SchemaNode::entry(ctx.clone(), name).identity();

        assert_eq!(via_primary.terminal(), name);
        assert_eq!(via_secondary.terminal(), name);
        assert_ne!(via_primary, via_secondary);
        assert_ne!(via_primary, direct);
        assert_ne!(via_secondary, direct);
        assert!(direct.hops().is_empty());

        let distinct: HashSet<SchemaNodeIdentity> =
            [via_primary, via_secondary, direct].into_iter().collect();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn test_same_path_same_identity() {
        let (ctx, deal, _) = contacts();
        let deal = Aggregate::entry(&ctx, deal).unwrap();
        assert_eq!(
            name_via(&deal, "Primary").identity(),
            name_via(&deal, "Primary").identity()
        );
    }

    #[test]
    fn test_nested_hops_are_outermost_first() {
        let mut b = SchemaDocument::builder("Schema");
        let country = b.add_root("Country", [("Type", "data-model")]);
        let code = b.add_child(country, "Code", [("Type", "word"), ("IsKey", "True")]);
        let city = b.add_root("City", [("Type", "data-model")]);
        b.add_child(city, "In", [("Type", "ref-to:Country"), ("IsKey", "True")]);
        let shop = b.add_root("Shop", [("Type", "data-model")]);
        b.add_child(shop, "At", [("Type", "ref-to:City")]);
        let ctx = Arc::new(SchemaParseContext::with_default_rule(b.build()).unwrap());

        let shop = Aggregate::entry(&ctx, shop).unwrap();
        let members = shop.members();
        let Member::Reference(at) = &members[0] else {
            panic!("expected a reference");
        };
        let city = at.target().unwrap();
        let keys = city.key_value_members();
        assert_eq!(keys.len(), 1);
        let identity = keys[0].identity();
        assert_eq!(identity.terminal(), code);
        let hop_names: Vec<&str> = identity
            .hops()
            .iter()
            .map(|h| ctx.document().node_name(*h))
            .collect();
        assert_eq!(hop_names, vec!["At", "In"]);
    }

    #[test]
    fn test_reference_walked_backwards_is_not_a_hop() {
        let mut b = SchemaDocument::builder("Schema");
        let customer = b.add_root("Customer", [("Type", "data-model")]);
        b.add_child(customer, "Code", [("Type", "word"), ("IsKey", "True")]);
        let order = b.add_root("Order", [("Type", "data-model")]);
        b.add_child(order, "No", [("Type", "int"), ("IsKey", "True")]);
        let buyer = b.add_child(order, "Buyer", [("Type", "ref-to:Customer")]);
        let ctx = Arc::new(SchemaParseContext::with_default_rule(b.build()).unwrap());

        let customer = Aggregate::entry(&ctx, customer).unwrap();
        let referrers = customer.ref_froms();
        assert_eq!(referrers.len(), 1);
        let back = referrers[0].owner().unwrap();

        assert_eq!(back.node().id(), order);
        assert_eq!(back.node().previous().map(SchemaNode::id), Some(buyer));
        assert!(back.identity().hops().is_empty());
        assert_eq!(back.identity(), Aggregate::entry(&ctx, order).unwrap().identity());

        let order = Aggregate::entry(&ctx, order).unwrap();
        let members = order.members();
        let Some(Member::Reference(rm)) = members.iter().find(|m| m.name() == "Buyer") else {
            panic!("missing reference Buyer");
        };
        let forward = rm.target().unwrap();
        assert_eq!(forward.identity().hops(), &[buyer]);
    }
}

use std::ops::Deref;

use super::{Aggregate, SchemaNode};
use crate::classify::NodeKind;
use crate::options::{NodeOption, RefToObject};
use crate::value_type::ValueMemberType;

/// A direct member of an aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Member {
    Value(ValueMember),
    NestedOne(Aggregate),
    NestedMany(Aggregate),
    Reference(RefMember),
    EnumValue(EnumValue),
}

impl Member {
    pub(crate) fn from_node(node: SchemaNode) -> Option<Self> {
        match node.kind() {
            NodeKind::NestedOne => Aggregate::from_node(node).map(Member::NestedOne),
            NodeKind::NestedMany => Aggregate::from_node(node).map(Member::NestedMany),
            NodeKind::ValueMember => ValueMember::from_node(node).map(Member::Value),
            NodeKind::Reference => Some(Member::Reference(RefMember::new(node))),
            NodeKind::EnumValue => Some(Member::EnumValue(EnumValue { node })),
            NodeKind::Root | NodeKind::Unknown => None,
        }
    }

    pub fn node(&self) -> &SchemaNode {
        match self {
            Member::Value(vm) => &vm.node,
            Member::NestedOne(a) | Member::NestedMany(a) => a.node(),
            Member::Reference(rm) => &rm.node,
            Member::EnumValue(ev) => &ev.node,
        }
    }

    /// Whether the member is a value or reference flagged `IsKey`.
    pub fn is_key(&self) -> bool {
        match self {
            Member::Value(_) | Member::Reference(_) => self.node().flag(NodeOption::IsKey),
            _ => false,
        }
    }
}

impl Deref for Member {
    type Target = SchemaNode;

    fn deref(&self) -> &SchemaNode {
        self.node()
    }
}

/// Leaf scalar member with a resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueMember {
    node: SchemaNode,
    value_type: ValueMemberType,
}

impl ValueMember {
    fn from_node(node: SchemaNode) -> Option<Self> {
        let value_type = node
            .context()
            .discriminator(node.id())
            .and_then(|d| node.context().resolve_value_type(d))?;
        Some(Self { node, value_type })
    }

    pub fn node(&self) -> &SchemaNode {
        &self.node
    }

    pub fn value_type(&self) -> &ValueMemberType {
        &self.value_type
    }

    pub fn owner(&self) -> Option<Aggregate> {
        owner_of(&self.node)
    }

    pub fn is_key(&self) -> bool {
        self.node.flag(NodeOption::IsKey)
    }

    pub fn is_required(&self) -> bool {
        self.node.flag(NodeOption::IsRequired)
    }

    pub fn max_length(&self) -> Option<u32> {
        self.number(NodeOption::MaxLength)
    }

    pub fn total_digit(&self) -> Option<u32> {
        self.number(NodeOption::TotalDigit)
    }

    pub fn decimal_place(&self) -> Option<u32> {
        self.number(NodeOption::DecimalPlace)
    }

    pub fn character_type(&self) -> Option<&str> {
        self.node.attribute(NodeOption::CharacterType.key())
    }

    fn number(&self, option: NodeOption) -> Option<u32> {
        self.node
            .attribute(option.key())
            .and_then(|v| v.trim().parse().ok())
    }
}

impl Deref for ValueMember {
    type Target = SchemaNode;

    fn deref(&self) -> &SchemaNode {
        &self.node
    }
}

/// Member pointing at another aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RefMember {
    node: SchemaNode,
}

impl RefMember {
    pub(crate) fn new(node: SchemaNode) -> Self {
        Self { node }
    }

    pub fn node(&self) -> &SchemaNode {
        &self.node
    }

    /// The referenced aggregate, reached through this reference.
    pub fn target(&self) -> Option<Aggregate> {
        self.node.ref_target()
    }

    pub fn owner(&self) -> Option<Aggregate> {
        owner_of(&self.node)
    }

    pub fn is_key(&self) -> bool {
        self.node.flag(NodeOption::IsKey)
    }

    pub fn is_required(&self) -> bool {
        self.node.flag(NodeOption::IsRequired)
    }

    /// Downstream role declared with `RefToObject`.
    pub fn ref_to_object(&self) -> Option<RefToObject> {
        self.node
            .attribute(NodeOption::RefToObject.key())
            .and_then(RefToObject::parse)
    }
}

impl Deref for RefMember {
    type Target = SchemaNode;

    fn deref(&self) -> &SchemaNode {
        &self.node
    }
}

/// Member of an enumeration definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    node: SchemaNode,
}

impl EnumValue {
    pub fn node(&self) -> &SchemaNode {
        &self.node
    }

    /// Integer value from the `key` attribute.
    pub fn key(&self) -> Option<i64> {
        self.node
            .attribute(NodeOption::EnumKey.key())
            .and_then(|v| v.trim().parse().ok())
    }

    pub fn owner(&self) -> Option<Aggregate> {
        owner_of(&self.node)
    }
}

impl Deref for EnumValue {
    type Target = SchemaNode;

    fn deref(&self) -> &SchemaNode {
        &self.node
    }
}

fn owner_of(node: &SchemaNode) -> Option<Aggregate> {
    let parent = node.context().document().parent(node.id())?;
    Aggregate::from_node(node.step(parent))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{SchemaDocument, SchemaParseContext};

    #[test]
    fn test_member_variants() {
        let mut b = SchemaDocument::builder("Schema");
        let status = b.add_root("Status", [("Type", "enum")]);
        b.add_child(status, "Open", [("key", "1")]);
        let order = b.add_root("Order", [("Type", "command-model")]);
        b.add_child(order, "Amount", [("Type", "decimal"), ("TotalDigit", "10"), ("DecimalPlace", "2")]);
        b.add_child(order, "State", [("Type", "Status"), ("IsRequired", "True")]);
        b.add_child(order, "Target", [("Type", "ref-to:Status"), ("RefToObject", "DisplayData")]);
        b.add_child(order, "Junk", [("Type", "nothing")]);
        let ctx = Arc::new(SchemaParseContext::with_default_rule(b.build()).unwrap());

        let order = Aggregate::entry(&ctx, order).unwrap();
        let members = order.members();
        assert_eq!(members.len(), 3);

        let Member::Value(amount) = &members[0] else { panic!("expected a value member") };
        assert_eq!(amount.value_type(), &ValueMemberType::Decimal);
        assert_eq!(amount.total_digit(), Some(10));
        assert_eq!(amount.decimal_place(), Some(2));
        assert_eq!(amount.max_length(), None);
        assert_eq!(amount.owner().unwrap(), order);

        let Member::Value(state) = &members[1] else { panic!("expected a value member") };
        assert_eq!(state.value_type(), &ValueMemberType::StaticEnum("Status".into()));
        assert!(state.is_required());
        assert!(!state.is_key());

        let Member::Reference(target) = &members[2] else { panic!("expected a reference") };
        assert_eq!(target.ref_to_object(), Some(RefToObject::DisplayData));
        assert_eq!(target.target().unwrap().name(), "Status");

        let status = Aggregate::entry(&ctx, status).unwrap();
        let values = status.members();
        let [Member::EnumValue(open)] = values.as_slice() else {
            panic!("expected one enum value")
        };
        assert_eq!(open.key(), Some(1));
    }

    #[test]
    #[should_panic(expected = "is not a reference")]
    fn test_ref_target_on_non_reference_panics() {
        let mut b = SchemaDocument::builder("Schema");
        let order = b.add_root("Order", [("Type", "data-model")]);
        let ctx = Arc::new(SchemaParseContext::with_default_rule(b.build()).unwrap());
        let _ = SchemaNode::entry(ctx, order).ref_target();
    }
}

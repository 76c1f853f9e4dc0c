//! Instance property metadata and path projection.
//!
//! Backends generate code that reads and writes structures shaped after the
//! schema. This module describes those structures without generating any
//! text: an [`InstanceOwnerMetadata`] lists the properties a structure will
//! have, a [`Variable`] names one instance of it, and [`InstanceProperty`]
//! values form the property tree reachable from that variable.
//!
//! Paths crossing array-valued properties switch from plain member access
//! to projections, see [`InstanceProperty::flatten_array_path`].
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use aggregate_schema_core::*;
//!
//! let mut b = SchemaDocument::builder("Schema");
//! let order = b.add_root("Order", [("Type", "data-model")]);
//! b.add_child(order, "No", [("Type", "int"), ("IsKey", "True")]);
//! let lines = b.add_child(order, "Lines", [("Type", "children")]);
//! b.add_child(lines, "Qty", [("Type", "int"), ("IsKey", "True")]);
//! let ctx = Arc::new(SchemaParseContext::with_default_rule(b.build()).unwrap());
//!
//! let order = Aggregate::entry(&ctx, order).unwrap();
//! let x = Variable::new("x", Arc::new(AggregateStructure::new(order)));
//! let props = InstanceOwner::from(x).create_properties_recursively();
//! let qty = props.iter().find(|p| p.name() == "Qty").unwrap();
//!
//! let path = qty.flatten_array_path();
//! assert!(path.is_many);
//! assert_eq!(path.join(PathDialect::CSharp), "Lines.Select(x => x.Qty)");
//! assert_eq!(path.join(PathDialect::TypeScript), "Lines.map(x => x.Qty)");
//! ```

use std::fmt;
use std::sync::Arc;

use crate::document::NodeId;
use crate::graph::{Aggregate, AggregateKind, Member};
use crate::identity::SchemaNodeIdentity;
use crate::value_type::ValueMemberType;

/// Describes the properties of a generated structure.
pub trait InstanceOwnerMetadata: fmt::Debug + Send + Sync {
    fn members(&self) -> Vec<PropertyMetadata>;
}

/// One property of a generated structure.
#[derive(Debug, Clone)]
pub enum PropertyMetadata {
    /// Leaf property holding a single value.
    Value {
        mapping_key: SchemaNodeIdentity,
        name: String,
        value_type: ValueMemberType,
    },
    /// Property holding a nested structure, or an array of them.
    Structure {
        mapping_key: SchemaNodeIdentity,
        name: String,
        is_array: bool,
        members: Arc<dyn InstanceOwnerMetadata>,
    },
}

impl PropertyMetadata {
    pub fn name(&self) -> &str {
        match self {
            PropertyMetadata::Value { name, .. } | PropertyMetadata::Structure { name, .. } => name,
        }
    }

    /// Identity of the schema node this property maps to.
    pub fn mapping_key(&self) -> &SchemaNodeIdentity {
        match self {
            PropertyMetadata::Value { mapping_key, .. }
            | PropertyMetadata::Structure { mapping_key, .. } => mapping_key,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, PropertyMetadata::Structure { is_array: true, .. })
    }

    /// Metadata of the nested structure, for structure properties.
    pub fn owner_metadata(&self) -> Option<&Arc<dyn InstanceOwnerMetadata>> {
        match self {
            PropertyMetadata::Structure { members, .. } => Some(members),
            PropertyMetadata::Value { .. } => None,
        }
    }
}

/// Every property metadata below `owner`, depth-first pre-order.
pub fn metadata_recursively(owner: &dyn InstanceOwnerMetadata) -> Vec<PropertyMetadata> {
    let mut out = Vec::new();
    for member in owner.members() {
        let nested = member.owner_metadata().cloned();
        out.push(member);
        if let Some(nested) = nested {
            out.extend(metadata_recursively(nested.as_ref()));
        }
    }
    out
}

#[derive(Debug)]
struct VariableInner {
    name: String,
    metadata: Arc<dyn InstanceOwnerMetadata>,
}

/// A named instance in generated code. Never nullable.
#[derive(Debug, Clone)]
pub struct Variable(Arc<VariableInner>);

impl Variable {
    pub fn new(name: impl Into<String>, metadata: Arc<dyn InstanceOwnerMetadata>) -> Self {
        Self(Arc::new(VariableInner {
            name: name.into(),
            metadata,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn metadata(&self) -> &Arc<dyn InstanceOwnerMetadata> {
        &self.0.metadata
    }

    pub fn is_nullable(&self) -> bool {
        false
    }
}

/// Anything properties can be created from: a variable or a structure
/// property.
#[derive(Debug, Clone)]
pub enum InstanceOwner {
    Variable(Variable),
    Structure(InstanceProperty),
}

impl InstanceOwner {
    /// Variable or property name.
    pub fn name(&self) -> &str {
        match self {
            InstanceOwner::Variable(v) => v.name(),
            InstanceOwner::Structure(p) => p.name(),
        }
    }

    /// The variable at the start of this owner's path.
    pub fn root(&self) -> &Variable {
        match self {
            InstanceOwner::Variable(v) => v,
            InstanceOwner::Structure(p) => p.root(),
        }
    }

    fn member_metadata(&self) -> Vec<PropertyMetadata> {
        match self {
            InstanceOwner::Variable(v) => v.metadata().members(),
            InstanceOwner::Structure(p) => p
                .metadata()
                .owner_metadata()
                .map(|m| m.members())
                .unwrap_or_default(),
        }
    }

    /// Direct properties of this owner.
    pub fn create_properties(&self) -> Vec<InstanceProperty> {
        self.member_metadata()
            .into_iter()
            .map(|metadata| InstanceProperty::new(self.clone(), metadata))
            .collect()
    }

    /// Every property below this owner, descending into all structures.
    pub fn create_properties_recursively(&self) -> Vec<InstanceProperty> {
        let mut out = Vec::new();
        self.collect_properties(&mut out, true);
        out
    }

    /// Properties below this owner that are one-to-one with it: structures
    /// are descended into only when they are not arrays. Array properties
    /// themselves are still listed.
    pub fn create_1to1_properties_recursively(&self) -> Vec<InstanceProperty> {
        let mut out = Vec::new();
        self.collect_properties(&mut out, false);
        out
    }

    fn collect_properties(&self, out: &mut Vec<InstanceProperty>, into_arrays: bool) {
        for property in self.create_properties() {
            out.push(property.clone());
            if into_arrays || !property.is_array() {
                if let Some(owner) = property.as_owner() {
                    owner.collect_properties(out, into_arrays);
                }
            }
        }
    }

    /// Flatten path of this owner; empty and not many for a variable.
    pub fn flatten_array_path(&self) -> FlattenArrayPath {
        match self {
            InstanceOwner::Variable(_) => FlattenArrayPath::default(),
            InstanceOwner::Structure(p) => p.flatten_array_path(),
        }
    }
}

impl From<Variable> for InstanceOwner {
    fn from(variable: Variable) -> Self {
        InstanceOwner::Variable(variable)
    }
}

struct PropertyInner {
    root: Variable,
    owner: InstanceOwner,
    metadata: PropertyMetadata,
}

/// A property of an instance, reached from a variable.
#[derive(Clone)]
pub struct InstanceProperty(Arc<PropertyInner>);

impl InstanceProperty {
    fn new(owner: InstanceOwner, metadata: PropertyMetadata) -> Self {
        Self(Arc::new(PropertyInner {
            root: owner.root().clone(),
            owner,
            metadata,
        }))
    }

    /// The variable this property was reached from.
    pub fn root(&self) -> &Variable {
        &self.0.root
    }

    pub fn owner(&self) -> &InstanceOwner {
        &self.0.owner
    }

    pub fn metadata(&self) -> &PropertyMetadata {
        &self.0.metadata
    }

    pub fn name(&self) -> &str {
        self.0.metadata.name()
    }

    pub fn mapping_key(&self) -> &SchemaNodeIdentity {
        self.0.metadata.mapping_key()
    }

    /// Properties are always nullable in generated code.
    pub fn is_nullable(&self) -> bool {
        true
    }

    pub fn is_array(&self) -> bool {
        self.0.metadata.is_array()
    }

    pub fn is_structure(&self) -> bool {
        self.0.metadata.owner_metadata().is_some()
    }

    /// This property as an owner, if it holds a structure.
    pub fn as_owner(&self) -> Option<InstanceOwner> {
        self.is_structure()
            .then(|| InstanceOwner::Structure(self.clone()))
    }

    /// Properties from the variable down to this one, nearest to the
    /// variable first. The variable itself is not included.
    pub fn path_from_instance(&self) -> Vec<InstanceProperty> {
        let mut path = vec![self.clone()];
        let mut owner = self.owner();
        while let InstanceOwner::Structure(p) = owner {
            path.push(p.clone());
            owner = p.owner();
        }
        path.reverse();
        path
    }

    /// Chained access from the variable (`x.Lines?.Select(e => e.Qty)`).
    ///
    /// Members following a nullable property are joined with
    /// `nullable_separator` (`?.` or `!.`), the others with `.`.
    pub fn joined_path_from_instance(&self, dialect: PathDialect, nullable_separator: &str) -> String {
        let mut out = self.root().name().to_string();
        let mut iterating = false;
        let mut previous: Option<&InstanceProperty> = None;
        let path = self.path_from_instance();

        for current in &path {
            match previous {
                Some(p) if p.is_nullable() => out.push_str(nullable_separator),
                _ => out.push('.'),
            }
            if iterating {
                let op = if current.is_array() {
                    dialect.flatten()
                } else {
                    dialect.project()
                };
                out.push_str(&format!("{op}(e => e.{})", current.name()));
            } else {
                out.push_str(current.name());
            }
            iterating |= current.is_array();
            previous = Some(current);
        }
        out
    }

    /// Path from the variable to this property with array boundaries
    /// flattened.
    ///
    /// Until the first array is crossed every step is plain member access.
    /// After it, single-valued steps project over the elements and
    /// array-valued steps flatten.
    pub fn flatten_array_path(&self) -> FlattenArrayPath {
        let mut segments = Vec::new();
        let mut is_many = false;
        for step in self.path_from_instance() {
            let name = step.name().to_string();
            if step.is_array() {
                segments.push(if is_many {
                    PathSegment::Flatten(name)
                } else {
                    PathSegment::Member(name)
                });
                is_many = true;
            } else if is_many {
                segments.push(PathSegment::Project(name));
            } else {
                segments.push(PathSegment::Member(name));
            }
        }
        FlattenArrayPath { segments, is_many }
    }
}

impl fmt::Debug for InstanceProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceProperty")
            .field("path", &self.joined_path_from_instance(PathDialect::CSharp, "."))
            .field("is_array", &self.is_array())
            .finish()
    }
}

/// Target language of rendered paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathDialect {
    /// `Select` / `SelectMany`.
    CSharp,
    /// `map` / `flatMap`.
    TypeScript,
}

impl PathDialect {
    fn project(self) -> &'static str {
        match self {
            PathDialect::CSharp => "Select",
            PathDialect::TypeScript => "map",
        }
    }

    fn flatten(self) -> &'static str {
        match self {
            PathDialect::CSharp => "SelectMany",
            PathDialect::TypeScript => "flatMap",
        }
    }
}

/// One step of a [`FlattenArrayPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Direct member access.
    Member(String),
    /// Project each element seen so far onto a member.
    Project(String),
    /// Project each element onto an array member and flatten.
    Flatten(String),
}

impl PathSegment {
    pub fn name(&self) -> &str {
        match self {
            PathSegment::Member(n) | PathSegment::Project(n) | PathSegment::Flatten(n) => n,
        }
    }

    pub fn render(&self, dialect: PathDialect) -> String {
        match self {
            PathSegment::Member(n) => n.clone(),
            PathSegment::Project(n) => format!("{}(x => x.{n})", dialect.project()),
            PathSegment::Flatten(n) => format!("{}(x => x.{n})", dialect.flatten()),
        }
    }
}

/// Result of [`InstanceProperty::flatten_array_path`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenArrayPath {
    pub segments: Vec<PathSegment>,
    /// Whether any array was crossed, i.e. the path yields a collection.
    pub is_many: bool,
}

impl FlattenArrayPath {
    pub fn render(&self, dialect: PathDialect) -> Vec<String> {
        self.segments.iter().map(|s| s.render(dialect)).collect()
    }

    /// Segments joined with `.`, without the variable.
    pub fn join(&self, dialect: PathDialect) -> String {
        self.render(dialect).join(".")
    }
}

/// Owner metadata of a structure shaped after an aggregate.
///
/// Value members become value properties, nested aggregates become
/// structures (arrays for nested-many), and references become structures
/// holding the referenced aggregate's keys. Enum values have no property.
#[derive(Debug, Clone)]
pub struct AggregateStructure {
    aggregate: Aggregate,
}

impl AggregateStructure {
    pub fn new(aggregate: Aggregate) -> Self {
        Self { aggregate }
    }

    pub fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }
}

impl InstanceOwnerMetadata for AggregateStructure {
    fn members(&self) -> Vec<PropertyMetadata> {
        let mut out = Vec::new();
        for member in self.aggregate.members() {
            match member {
                Member::Value(vm) => out.push(PropertyMetadata::Value {
                    mapping_key: vm.identity(),
                    name: vm.name().to_string(),
                    value_type: vm.value_type().clone(),
                }),
                Member::NestedOne(child) | Member::NestedMany(child) => {
                    out.push(PropertyMetadata::Structure {
                        mapping_key: child.identity(),
                        name: child.name().to_string(),
                        is_array: child.kind() == AggregateKind::NestedMany,
                        members: Arc::new(AggregateStructure::new(child)),
                    })
                }
                Member::Reference(rm) => {
                    if let Some(target) = rm.target() {
                        out.push(PropertyMetadata::Structure {
                            mapping_key: rm.identity(),
                            name: rm.name().to_string(),
                            is_array: false,
                            members: Arc::new(KeyStructure::new(target, Vec::new())),
                        });
                    }
                }
                Member::EnumValue(_) => {}
            }
        }
        out
    }
}

/// Keys of a referenced aggregate: the parent's keys as a nested `Parent`
/// structure, then the own keys, with reference keys nested in turn.
#[derive(Debug, Clone)]
struct KeyStructure {
    aggregate: Aggregate,
    expanded: Vec<NodeId>,
}

impl KeyStructure {
    const PARENT: &'static str = "Parent";

    fn new(aggregate: Aggregate, mut expanded: Vec<NodeId>) -> Self {
        expanded.push(aggregate.id());
        Self { aggregate, expanded }
    }
}

impl InstanceOwnerMetadata for KeyStructure {
    fn members(&self) -> Vec<PropertyMetadata> {
        let mut out = Vec::new();
        if let Some(parent) = self.aggregate.parent() {
            if !self.expanded.contains(&parent.id()) {
                out.push(PropertyMetadata::Structure {
                    mapping_key: parent.identity(),
                    name: Self::PARENT.to_string(),
                    is_array: false,
                    members: Arc::new(KeyStructure::new(parent, self.expanded.clone())),
                });
            }
        }
        for key in self.aggregate.own_keys() {
            match key {
                Member::Value(vm) => out.push(PropertyMetadata::Value {
                    mapping_key: vm.identity(),
                    name: vm.name().to_string(),
                    value_type: vm.value_type().clone(),
                }),
                Member::Reference(rm) => {
                    // Key references looping back are not expanded again.
                    let Some(target) = rm.target() else { continue };
                    if self.expanded.contains(&target.id()) {
                        continue;
                    }
                    out.push(PropertyMetadata::Structure {
                        mapping_key: rm.identity(),
                        name: rm.name().to_string(),
                        is_array: false,
                        members: Arc::new(KeyStructure::new(target, self.expanded.clone())),
                    });
                }
                _ => {}
            }
        }
        out
    }
}

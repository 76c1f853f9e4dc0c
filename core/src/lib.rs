//! Front end of the aggregate schema compiler.
//!
//! This crate reads an already-parsed schema document and turns it into a
//! validated, queryable model of aggregates:
//!
//! - [`SchemaDocument`]: the raw, immutable tree of named, attribute-bearing
//!   nodes.
//! - [`SchemaParseRule`] and [`SchemaParseContext`]: the vocabulary used to
//!   read the document and the lookup tables derived from it once.
//! - [`classify`]: decides what each raw node is ([`NodeKind`]).
//! - [`naming`]: physical, display, storage and fallback names.
//! - [`Aggregate`], [`Member`] and friends: graph views that remember the
//!   path that reached them, with path rewind.
//! - [`SchemaNodeIdentity`]: path-sensitive identity used as a mapping key.
//! - [`validate_document`] and [`ApplicationSchema::build`]: whole-document
//!   validation that reports every error, grouped per node.
//! - [`InstanceOwner`], [`InstanceProperty`]: property trees of generated
//!   structures and their access paths.
//!
//! Nothing here performs I/O; loading files is the loader crate's job.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use aggregate_schema_core::*;
//!
//! let mut b = SchemaDocument::builder("Sales");
//! let customer = b.add_root("Customer", [("Type", "data-model")]);
//! b.add_child(customer, "Code", [("Type", "word"), ("IsKey", "True")]);
//! let order = b.add_root("Order", [("Type", "data-model")]);
//! b.add_child(order, "No", [("Type", "int"), ("IsKey", "True")]);
//! b.add_child(order, "Buyer", [("Type", "ref-to:Customer")]);
//!
//! let ctx = Arc::new(SchemaParseContext::with_default_rule(b.build()).unwrap());
//! let schema = ApplicationSchema::build(ctx).unwrap();
//!
//! let order = schema.find_root("Order").unwrap();
//! assert_eq!(order.key_value_members().len(), 1);
//! let customer = schema.find_root("Customer").unwrap();
//! assert_eq!(customer.ref_froms().len(), 1);
//! ```

mod classify;
mod context;
mod document;
mod dump;
mod graph;
mod identity;
mod instance;
pub mod naming;
mod options;
mod rule;
mod schema;
mod validate;
mod value_type;

pub use classify::{NodeKind, classify};
pub use context::SchemaParseContext;
pub use document::{DocumentBuilder, NodeId, RawNode, SchemaDocument};
pub use dump::SchemaDump;
pub use graph::{Aggregate, AggregateKind, EnumValue, Member, RefMember, SchemaNode, ValueMember};
pub use identity::SchemaNodeIdentity;
pub use instance::{
    AggregateStructure, FlattenArrayPath, InstanceOwner, InstanceOwnerMetadata, InstanceProperty,
    PathDialect, PathSegment, PropertyMetadata, Variable, metadata_recursively,
};
pub use options::{NodeOption, RefToObject, parse_flag};
pub use rule::{
    DEFAULT_CHILD_MARKER, DEFAULT_CHILDREN_MARKER, DEFAULT_DISCRIMINATOR, DEFAULT_REF_PREFIX,
    ModelKind, RuleError, SchemaParseRule,
};
pub use schema::ApplicationSchema;
pub use validate::{
    ErrorCategory, ErrorReport, NodeErrors, NodeReport, ReportedError, SchemaErrors,
    ValidationError, validate_document,
};
pub use value_type::ValueMemberType;

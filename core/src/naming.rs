//! Name resolution for schema nodes.
//!
//! Physical names are the structural names, except for nested aggregates
//! whose structural name is shared with another nested aggregate somewhere
//! in the document: those become `"{parent physical name} of {name}"`.
//! Display and storage names fall back to the physical name.
//!
//! # Examples
//!
//! ```
//! use aggregate_schema_core::{SchemaDocument, SchemaParseContext, naming};
//!
//! let mut b = SchemaDocument::builder("Schema");
//! let order = b.add_root("Order", [("Type", "data-model")]);
//! let order_lines = b.add_child(order, "Lines", [("Type", "children")]);
//! let invoice = b.add_root("Invoice", [("Type", "data-model"), ("DbName", "INVOICES")]);
//! b.add_child(invoice, "Lines", [("Type", "children")]);
//! let ctx = SchemaParseContext::with_default_rule(b.build()).unwrap();
//!
//! assert_eq!(naming::physical_name(&ctx, order_lines), "Order of Lines");
//! assert_eq!(naming::storage_name(&ctx, invoice), "INVOICES");
//! assert_eq!(naming::display_name(&ctx, invoice), "Invoice");
//! ```

use sha2::{Digest, Sha256};

use crate::classify::NodeKind;
use crate::context::SchemaParseContext;
use crate::document::NodeId;
use crate::options::NodeOption;

/// Collision-resolved physical name.
pub fn physical_name(ctx: &SchemaParseContext, id: NodeId) -> String {
    let doc = ctx.document();
    let own = doc.node_name(id);
    match ctx.kind(id) {
        NodeKind::NestedOne | NodeKind::NestedMany if ctx.is_shared_nested_name(own) => {
            match doc.parent(id) {
                Some(parent) => format!("{} of {}", physical_name(ctx, parent), own),
                None => own.to_string(),
            }
        }
        _ => own.to_string(),
    }
}

/// `DisplayName` override or the physical name.
pub fn display_name(ctx: &SchemaParseContext, id: NodeId) -> String {
    override_or_physical(ctx, id, NodeOption::DisplayName)
}

/// `DbName` override or the physical name.
pub fn storage_name(ctx: &SchemaParseContext, id: NodeId) -> String {
    override_or_physical(ctx, id, NodeOption::DbName)
}

/// Locale-independent name: `LatinName` override, otherwise derived from
/// the SHA-256 digest of the physical name.
pub fn latin_name(ctx: &SchemaParseContext, id: NodeId) -> String {
    if let Some(latin) = non_blank(ctx, id, NodeOption::LatinName) {
        return latin.to_string();
    }
    hashed_name(&physical_name(ctx, id))
}

/// Identifier-safe name derived from a digest of `name`.
///
/// ```
/// use aggregate_schema_core::naming::hashed_name;
///
/// let a = hashed_name("顧客");
/// assert!(a.starts_with("n_"));
/// assert_eq!(a.len(), 18);
/// assert_eq!(a, hashed_name("顧客"));
/// ```
pub fn hashed_name(name: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(name.as_bytes()));
    format!("n_{}", &digest[..16])
}

fn override_or_physical(ctx: &SchemaParseContext, id: NodeId, option: NodeOption) -> String {
    match non_blank(ctx, id, option) {
        Some(value) => value.to_string(),
        None => physical_name(ctx, id),
    }
}

fn non_blank(ctx: &SchemaParseContext, id: NodeId, option: NodeOption) -> Option<&str> {
    ctx.document()
        .attribute(id, option.key())
        .filter(|v| !v.trim().is_empty())
}

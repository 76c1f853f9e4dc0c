//! Name collision checks.

use std::collections::{HashMap, HashSet};

use super::{Findings, ValidationError};
use crate::classify::NodeKind;
use crate::context::SchemaParseContext;
use crate::document::NodeId;
use crate::naming::{physical_name, storage_name};
use crate::rule::ModelKind;

pub(super) fn check(ctx: &SchemaParseContext, findings: &mut Findings<'_>) {
    root_names(ctx, findings);
    sibling_names(ctx, findings);
    storage_names(ctx, findings);
}

fn root_names(ctx: &SchemaParseContext, findings: &mut Findings<'_>) {
    let mut seen = HashSet::new();
    for root in ctx.document().top_level() {
        let name = physical_name(ctx, *root);
        if !seen.insert(name.clone()) {
            findings.node(*root, ValidationError::DuplicateRootName(name));
        }
    }
}

fn sibling_names(ctx: &SchemaParseContext, findings: &mut Findings<'_>) {
    let doc = ctx.document();
    for parent in doc.iter() {
        let mut seen = HashSet::new();
        for child in doc.children(parent) {
            let name = physical_name(ctx, *child);
            if !seen.insert(name.clone()) {
                findings.node(*child, ValidationError::DuplicateSiblingName(name));
            }
        }
    }
}

/// Every stored node (aggregates and their columns) shares one storage
/// namespace across the whole document.
fn storage_names(ctx: &SchemaParseContext, findings: &mut Findings<'_>) {
    let mut scope = StorageScope::default();
    for id in ctx.document().iter() {
        if is_stored(ctx, id) {
            scope.claim(ctx, id, findings);
        }
    }
}

/// Enumeration definitions declare a type, not a table.
fn is_stored(ctx: &SchemaParseContext, id: NodeId) -> bool {
    let kind = ctx.kind(id);
    let stored = kind.is_aggregate() || matches!(kind, NodeKind::ValueMember | NodeKind::Reference);
    stored && ctx.model_of(id) != Some(ModelKind::StaticEnum)
}

#[derive(Default)]
struct StorageScope {
    claimed: HashMap<String, Vec<NodeId>>,
}

impl StorageScope {
    fn claim(&mut self, ctx: &SchemaParseContext, id: NodeId, findings: &mut Findings<'_>) {
        let storage = storage_name(ctx, id);
        let owners = self.claimed.entry(storage.clone()).or_default();
        if owners.iter().any(|owner| !same_name_collision(ctx, *owner, id)) {
            findings.node(id, ValidationError::DuplicateStorageName(storage));
        }
        owners.push(id);
    }
}

/// Two roots, or two siblings, with one physical name. The root and
/// sibling checks report these.
fn same_name_collision(ctx: &SchemaParseContext, a: NodeId, b: NodeId) -> bool {
    let doc = ctx.document();
    doc.parent(a) == doc.parent(b) && physical_name(ctx, a) == physical_name(ctx, b)
}

//! Reference target, self-containment, compatibility and cycle checks.

use std::collections::{HashMap, HashSet, VecDeque};

use super::{Findings, ValidationError};
use crate::classify::NodeKind;
use crate::context::SchemaParseContext;
use crate::document::NodeId;
use crate::options::{NodeOption, parse_flag};
use crate::rule::ModelKind;

pub(super) fn check(ctx: &SchemaParseContext, findings: &mut Findings<'_>) {
    let edges = projection_edges(ctx);
    for id in ctx.document().iter() {
        if ctx.kind(id) == NodeKind::Reference {
            reference(ctx, id, &edges, findings);
        }
    }
}

fn reference(
    ctx: &SchemaParseContext,
    id: NodeId,
    edges: &HashMap<NodeId, Vec<NodeId>>,
    findings: &mut Findings<'_>,
) {
    let doc = ctx.document();
    let segments = ctx.reference_path(id).unwrap_or_default();
    if segments.is_empty() {
        findings.node(id, ValidationError::MissingReferenceTarget);
        return;
    }
    let written = segments.join("/");

    let Some(target) = ctx.resolve_reference(id) else {
        findings.node(id, ValidationError::ReferenceTargetNotFound(written));
        return;
    };
    if !ctx.kind(target).is_aggregate() {
        findings.node(id, ValidationError::ReferenceTargetNotAggregate(written));
        return;
    }
    let source_root = doc.root_of(id);
    let target_root = doc.root_of(target);
    if source_root == target_root {
        findings.node(id, ValidationError::SelfReference(written));
        return;
    }

    let (Some(from), Some(to)) = (ctx.model_of(id), ctx.model_of(target)) else {
        return;
    };
    match from {
        ModelKind::DataModel => {
            if to != ModelKind::DataModel {
                findings.node(id, ValidationError::IncompatibleReference { from, to });
            }
        }
        ModelKind::QueryModel => {
            if !is_read_projection(ctx, target_root) {
                findings.node(id, projection_error(from, to, written));
            } else if reaches(edges, target_root, source_root) {
                findings.node(id, ValidationError::ReferenceCycle(written));
            }
        }
        ModelKind::CommandModel => {
            if !is_read_projection(ctx, target_root) {
                findings.node(id, projection_error(from, to, written));
            }
            if doc.attribute(id, NodeOption::RefToObject.key()).is_none() {
                findings.node(id, ValidationError::MissingRefToObject);
            }
        }
        ModelKind::StaticEnum | ModelKind::ValueObject => {
            findings.node(id, ValidationError::IncompatibleReference { from, to });
        }
    }
}

/// A data model without a default query model gets the more specific error.
fn projection_error(from: ModelKind, to: ModelKind, written: String) -> ValidationError {
    if to == ModelKind::DataModel {
        ValidationError::NotReadProjection(written)
    } else {
        ValidationError::IncompatibleReference { from, to }
    }
}

/// Query models, and data models that opt into a default query model.
fn is_read_projection(ctx: &SchemaParseContext, root: NodeId) -> bool {
    match ctx.discriminator(root).and_then(|d| ctx.rule().model(d)) {
        Some(ModelKind::QueryModel) => true,
        Some(ModelKind::DataModel) => ctx
            .document()
            .attribute(root, NodeOption::GenerateDefaultQueryModel.key())
            .and_then(parse_flag)
            .unwrap_or(false),
        _ => false,
    }
}

/// Root-to-root reference edges among read projections.
fn projection_edges(ctx: &SchemaParseContext) -> HashMap<NodeId, Vec<NodeId>> {
    let doc = ctx.document();
    let mut edges: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for id in doc.iter() {
        if ctx.kind(id) != NodeKind::Reference {
            continue;
        }
        let Some(target) = ctx.resolve_reference(id) else {
            continue;
        };
        let (from, to) = (doc.root_of(id), doc.root_of(target));
        if from != to && is_read_projection(ctx, from) && is_read_projection(ctx, to) {
            edges.entry(from).or_default().push(to);
        }
    }
    edges
}

/// Breadth-first search from `start`, true if `goal` is revisited.
fn reaches(edges: &HashMap<NodeId, Vec<NodeId>>, start: NodeId, goal: NodeId) -> bool {
    let mut queue = VecDeque::from([start]);
    let mut seen = HashSet::from([start]);
    while let Some(current) = queue.pop_front() {
        if current == goal {
            return true;
        }
        for next in edges.get(&current).into_iter().flatten() {
            if seen.insert(*next) {
                queue.push_back(*next);
            }
        }
    }
    false
}

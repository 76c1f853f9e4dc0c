//! Per-kind shape rules and model validators.

use std::sync::Arc;

use super::{Findings, ValidationError};
use crate::classify::NodeKind;
use crate::context::SchemaParseContext;
use crate::document::NodeId;
use crate::graph::Aggregate;
use crate::rule::ModelKind;

pub(super) fn check(ctx: &Arc<SchemaParseContext>, findings: &mut Findings<'_>) {
    for id in ctx.document().iter() {
        match ctx.kind(id) {
            NodeKind::Unknown => unknown(ctx, id, findings),
            NodeKind::Root => root(ctx, id, findings),
            kind @ (NodeKind::NestedOne | NodeKind::NestedMany) => nested(ctx, id, kind, findings),
            kind @ (NodeKind::ValueMember | NodeKind::Reference) => member(ctx, id, kind, findings),
            NodeKind::EnumValue => enum_value(ctx, id, findings),
        }
    }
}

fn missing_discriminator(ctx: &SchemaParseContext) -> ValidationError {
    ValidationError::MissingDiscriminator {
        attribute: ctx.rule().discriminator.clone(),
    }
}

fn unknown(ctx: &SchemaParseContext, id: NodeId, findings: &mut Findings<'_>) {
    match ctx.discriminator(id) {
        Some(d) if !d.trim().is_empty() => {
            findings.node(id, ValidationError::UnresolvedType(d.to_string()))
        }
        _ => findings.node(id, missing_discriminator(ctx)),
    }
}

fn root(ctx: &Arc<SchemaParseContext>, id: NodeId, findings: &mut Findings<'_>) {
    let model = match ctx.discriminator(id) {
        Some(d) if !d.trim().is_empty() => match ctx.rule().model(d) {
            Some(model) => model,
            None => {
                findings.node(
                    id,
                    ValidationError::UnknownModel {
                        name: d.to_string(),
                        expected: ctx.rule().model_names(),
                    },
                );
                return;
            }
        },
        _ => {
            findings.node(id, missing_discriminator(ctx));
            return;
        }
    };

    match model {
        ModelKind::DataModel | ModelKind::QueryModel => {
            let has_key = Aggregate::entry(ctx, id).is_some_and(|a| !a.own_keys().is_empty());
            if !has_key {
                findings.node(id, ValidationError::MissingKey);
            }
        }
        ModelKind::StaticEnum => {
            if ctx.document().children(id).is_empty() {
                findings.node(id, ValidationError::EmptyEnum);
            }
        }
        ModelKind::CommandModel | ModelKind::ValueObject => {}
    }
}

fn nested(ctx: &Arc<SchemaParseContext>, id: NodeId, kind: NodeKind, findings: &mut Findings<'_>) {
    if !placed_under_aggregate(ctx, id, kind, findings) {
        return;
    }

    let doc = ctx.document();
    let root = doc.root_of(id);
    let Some(model) = ctx.model_of(id) else {
        return;
    };
    if model.declares_value_type() {
        findings.node(
            id,
            ValidationError::InvalidNesting {
                kind,
                parent: format!("the {model} '{}'", doc.node_name(root)),
            },
        );
        return;
    }

    let Some(aggregate) = Aggregate::entry(ctx, id) else {
        return;
    };
    let keys = aggregate.own_keys();
    let keys_forbidden = match model {
        ModelKind::DataModel => {
            if kind == NodeKind::NestedMany && keys.is_empty() {
                findings.node(id, ValidationError::MissingKey);
            }
            kind == NodeKind::NestedOne
        }
        ModelKind::QueryModel => true,
        _ => false,
    };
    if keys_forbidden {
        for key in keys {
            findings.node(id, ValidationError::ForbiddenKey(key.name().to_string()));
        }
    }
}

fn member(ctx: &SchemaParseContext, id: NodeId, kind: NodeKind, findings: &mut Findings<'_>) {
    placed_under_aggregate(ctx, id, kind, findings);
    if !ctx.document().children(id).is_empty() {
        findings.node(id, ValidationError::LeafWithChildren(kind));
    }

    if kind == NodeKind::ValueMember {
        let Some(value_type) = ctx.discriminator(id).and_then(|d| ctx.resolve_value_type(d)) else {
            return;
        };
        for (attribute, error) in value_type.validate(ctx, id) {
            findings.attribute(id, attribute, error);
        }
    }
}

fn enum_value(ctx: &SchemaParseContext, id: NodeId, findings: &mut Findings<'_>) {
    if ctx.discriminator(id).is_some() {
        findings.attribute(
            id,
            &ctx.rule().discriminator,
            ValidationError::EnumValueWithType,
        );
    }
    if !ctx.document().children(id).is_empty() {
        findings.node(id, ValidationError::LeafWithChildren(NodeKind::EnumValue));
    }
}

/// Reports `id` when its structural parent is not an aggregate.
fn placed_under_aggregate(
    ctx: &SchemaParseContext,
    id: NodeId,
    kind: NodeKind,
    findings: &mut Findings<'_>,
) -> bool {
    let Some(parent) = ctx.document().parent(id) else {
        return true;
    };
    let parent_kind = ctx.kind(parent);
    if parent_kind.is_aggregate() {
        return true;
    }
    findings.node(
        id,
        ValidationError::InvalidNesting {
            kind,
            parent: format!("a {parent_kind}"),
        },
    );
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_document;
    use crate::{ErrorCategory, SchemaDocument};

    fn structural(build: impl FnOnce(&mut crate::DocumentBuilder)) -> Vec<(String, ValidationError)> {
        let mut b = SchemaDocument::builder("Schema");
        build(&mut b);
        let ctx = Arc::new(SchemaParseContext::with_default_rule(b.build()).unwrap());
        validate_document(&ctx)
            .nodes()
            .iter()
            .flat_map(|n| n.all().map(|e| (n.path.clone(), e.clone())).collect::<Vec<_>>())
            .filter(|(_, e)| {
                matches!(
                    e.category(),
                    ErrorCategory::Structural | ErrorCategory::Classification | ErrorCategory::TypeResolution
                )
            })
            .collect()
    }

    #[test]
    fn test_unknown_nodes() {
        let errors = structural(|b| {
            let a = b.add_root("A", [("Type", "command-model")]);
            b.add_child(a, "NoType", [("DisplayName", "x")]);
            b.add_child(a, "Bad", [("Type", "wrod")]);
        });
        assert_eq!(
            errors,
            vec![
                (
                    "A/NoType".to_string(),
                    ValidationError::MissingDiscriminator { attribute: "Type".into() }
                ),
                ("A/Bad".to_string(), ValidationError::UnresolvedType("wrod".into())),
            ]
        );
    }

    #[test]
    fn test_unknown_model_lists_valid_models() {
        let errors = structural(|b| {
            b.add_root("A", [("Type", "read-model")]);
        });
        let [(_, ValidationError::UnknownModel { name, expected })] = errors.as_slice() else {
            panic!("unexpected errors: {errors:?}");
        };
        assert_eq!(name, "read-model");
        assert!(expected.contains("data-model"));
        assert!(expected.contains("query-model"));
    }

    #[test]
    fn test_data_model_key_rules() {
        let errors = structural(|b| {
            let a = b.add_root("A", [("Type", "data-model")]);
            b.add_child(a, "Id", [("Type", "word"), ("IsKey", "True")]);
            let one = b.add_child(a, "Detail", [("Type", "child")]);
            b.add_child(one, "Code", [("Type", "word"), ("IsKey", "True")]);
            let many = b.add_child(a, "Lines", [("Type", "children")]);
            b.add_child(many, "Memo", [("Type", "word")]);
        });
        assert_eq!(
            errors,
            vec![
                ("A/Detail".to_string(), ValidationError::ForbiddenKey("Code".into())),
                ("A/Lines".to_string(), ValidationError::MissingKey),
            ]
        );
    }

    #[test]
    fn test_query_model_nested_keys_forbidden() {
        let errors = structural(|b| {
            let a = b.add_root("A", [("Type", "query-model")]);
            b.add_child(a, "Id", [("Type", "word"), ("IsKey", "True")]);
            let many = b.add_child(a, "Rows", [("Type", "children")]);
            b.add_child(many, "No", [("Type", "int"), ("IsKey", "True")]);
        });
        assert_eq!(
            errors,
            vec![("A/Rows".to_string(), ValidationError::ForbiddenKey("No".into()))]
        );
    }

    #[test]
    fn test_command_model_needs_no_key() {
        let errors = structural(|b| {
            let a = b.add_root("A", [("Type", "command-model")]);
            b.add_child(a, "Memo", [("Type", "word")]);
        });
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_enum_rules() {
        let errors = structural(|b| {
            b.add_root("Empty", [("Type", "enum")]);
            let status = b.add_root("Status", [("Type", "enum")]);
            b.add_child(status, "Open", [("key", "1")]);
            b.add_child(status, "Closed", [("key", "2"), ("Type", "word")]);
            b.add_child(status, "Nested", [("Type", "child")]);
        });
        assert_eq!(
            errors,
            vec![
                ("Empty".to_string(), ValidationError::EmptyEnum),
                ("Status/Closed".to_string(), ValidationError::EnumValueWithType),
                (
                    "Status/Nested".to_string(),
                    ValidationError::InvalidNesting {
                        kind: NodeKind::NestedOne,
                        parent: "the enum 'Status'".into(),
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_leaf_with_children() {
        let errors = structural(|b| {
            let a = b.add_root("A", [("Type", "command-model")]);
            let memo = b.add_child(a, "Memo", [("Type", "word")]);
            b.add_child(memo, "Inner", [("Type", "children")]);
        });
        assert_eq!(
            errors,
            vec![
                ("A/Memo".to_string(), ValidationError::LeafWithChildren(NodeKind::ValueMember)),
                (
                    "A/Memo/Inner".to_string(),
                    ValidationError::InvalidNesting {
                        kind: NodeKind::NestedMany,
                        parent: "a value member".into(),
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_type_option_errors_go_to_attributes() {
        let mut b = SchemaDocument::builder("Schema");
        let a = b.add_root("A", [("Type", "command-model")]);
        let n = b.add_child(a, "N", [("Type", "int"), ("MaxLength", "3")]);
        let ctx = Arc::new(SchemaParseContext::with_default_rule(b.build()).unwrap());
        let errors = validate_document(&ctx);
        let node = errors.for_node(n).unwrap();
        assert!(node.errors.is_empty());
        assert!(matches!(
            node.attribute_errors["MaxLength"].as_slice(),
            [ValidationError::OptionNotApplicableToType { .. }]
        ));
    }
}

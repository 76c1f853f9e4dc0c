//! Attribute option checks.

use std::collections::HashSet;

use super::{Findings, ValidationError};
use crate::classify::NodeKind;
use crate::context::SchemaParseContext;
use crate::document::NodeId;
use crate::options::{NodeOption, parse_flag};

pub(super) fn check(ctx: &SchemaParseContext, findings: &mut Findings<'_>) {
    let doc = ctx.document();
    for id in doc.iter() {
        let kind = ctx.kind(id);
        let model = ctx.model_of(id);
        for (key, value) in doc.attributes(id) {
            if *key == ctx.rule().discriminator {
                continue;
            }
            let Some(option) = ctx.rule().option(key) else {
                findings.attribute(id, key, ValidationError::UnknownOption(key.clone()));
                continue;
            };
            if let Err(reason) = option.availability(model, kind) {
                findings.attribute(
                    id,
                    key,
                    ValidationError::OptionNotAvailable {
                        option: key.clone(),
                        reason: reason.to_string(),
                    },
                );
                continue;
            }
            for error in option.validate(value) {
                findings.attribute(id, key, error);
            }
        }

        requires(
            ctx,
            id,
            NodeOption::GenerateBatchUpdateCommand,
            NodeOption::GenerateDefaultQueryModel,
            findings,
        );
        if kind.is_aggregate() {
            duplicate_enum_keys(ctx, id, findings);
        }
    }
}

fn flag(ctx: &SchemaParseContext, id: NodeId, option: NodeOption) -> bool {
    ctx.document()
        .attribute(id, option.key())
        .and_then(parse_flag)
        .unwrap_or(false)
}

fn requires(
    ctx: &SchemaParseContext,
    id: NodeId,
    option: NodeOption,
    required: NodeOption,
    findings: &mut Findings<'_>,
) {
    if flag(ctx, id, option) && !flag(ctx, id, required) {
        findings.attribute(
            id,
            option.key(),
            ValidationError::OptionRequires {
                option: option.key().to_string(),
                required: required.key().to_string(),
            },
        );
    }
}

/// Reports every enum value whose key was already used by an earlier sibling.
fn duplicate_enum_keys(ctx: &SchemaParseContext, parent: NodeId, findings: &mut Findings<'_>) {
    let key = NodeOption::EnumKey.key();
    let mut seen = HashSet::new();
    for child in ctx.document().children(parent) {
        if ctx.kind(*child) != NodeKind::EnumValue {
            continue;
        }
        let Some(value) = ctx
            .document()
            .attribute(*child, key)
            .and_then(|v| v.trim().parse::<i64>().ok())
        else {
            continue;
        };
        if !seen.insert(value) {
            findings.attribute(*child, key, ValidationError::DuplicateEnumKey(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use super::*;
    use crate::validate::validate_document;
    use crate::SchemaDocument;

    fn attribute_errors(
        build: impl FnOnce(&mut crate::DocumentBuilder),
    ) -> BTreeMap<String, BTreeMap<String, Vec<ValidationError>>> {
        let mut b = SchemaDocument::builder("Schema");
        build(&mut b);
        let ctx = Arc::new(SchemaParseContext::with_default_rule(b.build()).unwrap());
        validate_document(&ctx)
            .nodes()
            .iter()
            .filter(|n| !n.attribute_errors.is_empty())
            .map(|n| (n.path.clone(), n.attribute_errors.clone()))
            .collect()
    }

    #[test]
    fn test_unknown_and_unavailable_options() {
        let errors = attribute_errors(|b| {
            let c = b.add_root("C", [("Type", "command-model"), ("Colour", "red")]);
            b.add_child(c, "Memo", [("Type", "word"), ("IsKey", "True")]);
        });
        assert_eq!(
            errors["C"]["Colour"],
            vec![ValidationError::UnknownOption("Colour".into())]
        );
        assert!(matches!(
            errors["C/Memo"]["IsKey"].as_slice(),
            [ValidationError::OptionNotAvailable { option, .. }] if option == "IsKey"
        ));
    }

    #[test]
    fn test_invalid_values() {
        let errors = attribute_errors(|b| {
            let a = b.add_root("A", [("Type", "data-model"), ("GenerateDefaultQueryModel", "yes")]);
            b.add_child(a, "Id", [("Type", "word"), ("IsKey", "True"), ("MaxLength", "x")]);
        });
        assert_eq!(errors["A"]["GenerateDefaultQueryModel"].len(), 1);
        assert_eq!(errors["A/Id"]["MaxLength"].len(), 1);
    }

    #[test]
    fn test_batch_update_requires_default_query_model() {
        let errors = attribute_errors(|b| {
            let a = b.add_root("A", [("Type", "data-model"), ("GenerateBatchUpdateCommand", "True")]);
            b.add_child(a, "Id", [("Type", "word"), ("IsKey", "True")]);
            let ok = b.add_root(
                "B",
                [
                    ("Type", "data-model"),
                    ("GenerateBatchUpdateCommand", "True"),
                    ("GenerateDefaultQueryModel", "True"),
                ],
            );
            b.add_child(ok, "Id", [("Type", "word"), ("IsKey", "True")]);
        });
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors["A"]["GenerateBatchUpdateCommand"],
            vec![ValidationError::OptionRequires {
                option: "GenerateBatchUpdateCommand".into(),
                required: "GenerateDefaultQueryModel".into(),
            }]
        );
    }

    #[test]
    fn test_duplicate_enum_keys() {
        let errors = attribute_errors(|b| {
            let e = b.add_root("Status", [("Type", "enum")]);
            b.add_child(e, "Open", [("key", "1")]);
            b.add_child(e, "Closed", [("key", "2")]);
            b.add_child(e, "Reopened", [("key", "1")]);
            b.add_child(e, "Stored", [("key", "3"), ("DbName", "S")]);
        });
        assert_eq!(
            errors["Status/Reopened"]["key"],
            vec![ValidationError::DuplicateEnumKey(1)]
        );
        assert!(errors["Status/Stored"].contains_key("DbName"));
        assert!(!errors.contains_key("Status/Open"));
    }
}

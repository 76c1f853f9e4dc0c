//! Markdown rendering of a validated schema.

use std::fmt;
use std::sync::Arc;

use crate::graph::{Aggregate, AggregateKind, Member};
use crate::instance::{AggregateStructure, InstanceOwner, PathDialect, Variable};
use crate::schema::ApplicationSchema;

const VARIABLE: &str = "x";

/// Markdown document describing an [`ApplicationSchema`]: a Mermaid class
/// diagram followed by one property table per root aggregate.
pub struct SchemaDump<'a> {
    schema: &'a ApplicationSchema,
}

impl ApplicationSchema {
    pub fn dump(&self) -> SchemaDump<'_> {
        SchemaDump { schema: self }
    }

    /// The schema rendered as Markdown.
    pub fn markdown_dump(&self) -> String {
        self.dump().to_string()
    }
}

impl fmt::Display for SchemaDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roots = self.schema.root_aggregates();
        let all = self.schema.all_aggregates();

        writeln!(f, "# {}", self.schema.context().document().name())?;
        writeln!(f)?;
        writeln!(f, "## Aggregates")?;
        writeln!(f)?;
        writeln!(f, "```mermaid")?;
        writeln!(f, "classDiagram")?;
        for aggregate in &all {
            class_definition(f, aggregate)?;
        }
        for aggregate in &all {
            relations(f, aggregate)?;
        }
        writeln!(f, "```")?;

        writeln!(f)?;
        writeln!(f, "## Properties")?;
        for root in &roots {
            property_table(f, root)?;
        }
        Ok(())
    }
}

/// Mermaid identifiers cannot contain spaces; labels carry the real name.
fn diagram_id(aggregate: &Aggregate) -> String {
    aggregate
        .physical_name()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

fn class_definition(f: &mut fmt::Formatter<'_>, aggregate: &Aggregate) -> fmt::Result {
    writeln!(
        f,
        "    class {}[\"{}\"] {{",
        diagram_id(aggregate),
        aggregate.physical_name()
    )?;
    writeln!(f, "        <<{}>>", kind_label(aggregate.kind()))?;
    for member in aggregate.members() {
        if let Member::Value(vm) = member {
            let marker = if vm.is_key() { " PK" } else { "" };
            writeln!(f, "        {}: {}{marker}", vm.physical_name(), vm.value_type())?;
        }
    }
    writeln!(f, "    }}")
}

fn relations(f: &mut fmt::Formatter<'_>, aggregate: &Aggregate) -> fmt::Result {
    let id = diagram_id(aggregate);
    for member in aggregate.members() {
        match member {
            Member::NestedOne(child) => {
                writeln!(f, "    {id} *-- {} : {}", diagram_id(&child), child.name())?;
            }
            Member::NestedMany(child) => {
                writeln!(f, "    {id} *-- \"*\" {} : {}", diagram_id(&child), child.name())?;
            }
            Member::Reference(rm) => {
                if let Some(target) = rm.target() {
                    writeln!(f, "    {id} --> {} : {}", diagram_id(&target), rm.name())?;
                }
            }
            Member::Value(_) | Member::EnumValue(_) => {}
        }
    }
    Ok(())
}

fn property_table(f: &mut fmt::Formatter<'_>, root: &Aggregate) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "### {}", root.display_name())?;
    writeln!(f)?;

    let structure = AggregateStructure::new(root.clone());
    let variable = Variable::new(VARIABLE, Arc::new(structure));
    let properties = InstanceOwner::from(variable).create_properties_recursively();
    if properties.is_empty() {
        return writeln!(f, "No properties.");
    }

    writeln!(f, "| Owner | Property | Path | Kind | Nullable |")?;
    writeln!(f, "| :-- | :-- | :-- | :-- | :-- |")?;
    for property in &properties {
        let kind = if property.is_array() {
            "array"
        } else if property.is_structure() {
            "structure"
        } else {
            "value"
        };
        let path = property.flatten_array_path().join(PathDialect::CSharp);
        writeln!(
            f,
            "| {} | {} | `{VARIABLE}.{path}` | {kind} | {} |",
            property.owner().name(),
            property.name(),
            if property.is_nullable() { "yes" } else { "no" },
        )?;
    }
    Ok(())
}

fn kind_label(kind: AggregateKind) -> &'static str {
    match kind {
        AggregateKind::Root => "root",
        AggregateKind::NestedOne => "child",
        AggregateKind::NestedMany => "children",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SchemaDocument, SchemaParseContext};

    fn schema() -> ApplicationSchema {
        let mut b = SchemaDocument::builder("Sales");
        let customer = b.add_root("Customer", [("Type", "data-model")]);
        b.add_child(customer, "Code", [("Type", "word"), ("IsKey", "True")]);
        let columns = [("Order", "No", "Buyer", "Qty"), ("Invoice", "InvoiceNo", "Payer", "Units")];
        for (root, no, party, qty) in columns {
            let a = b.add_root(root, [("Type", "data-model")]);
            b.add_child(a, no, [("Type", "int"), ("IsKey", "True")]);
            b.add_child(a, party, [("Type", "ref-to:Customer")]);
            let lines = b.add_child(a, "Lines", [("Type", "children")]);
            b.add_child(lines, qty, [("Type", "int"), ("IsKey", "True")]);
        }
        let ctx = Arc::new(SchemaParseContext::with_default_rule(b.build()).unwrap());
        ApplicationSchema::build(ctx).unwrap()
    }

    #[test]
    fn test_class_diagram() {
        let dump = schema().markdown_dump();
        assert!(dump.starts_with("# Sales\n"));
        assert!(dump.contains("```mermaid\nclassDiagram\n"));
        assert!(dump.contains("    class Order_of_Lines[\"Order of Lines\"] {"));
        assert!(dump.contains("        Code: word PK"));
        assert!(dump.contains("    class Customer[\"Customer\"] {\n        <<root>>\n"));
        assert!(dump.contains("    Order *-- \"*\" Order_of_Lines : Lines"));
        assert!(dump.contains("    Invoice --> Customer : Payer"));
    }

    #[test]
    fn test_property_tables() {
        let dump = schema().markdown_dump();
        assert!(dump.contains("### Order\n"));
        assert!(dump.contains("| Lines | Qty | `x.Lines.Select(x => x.Qty)` | value | yes |"));
        assert!(dump.contains("| Buyer | Code | `x.Buyer.Code` | value | yes |"));
        assert!(dump.contains("| x | Lines | `x.Lines` | array | yes |"));
    }
}

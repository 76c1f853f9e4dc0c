//! The validated, queryable application schema.

use std::sync::Arc;

use tracing::{debug, info};

use crate::context::SchemaParseContext;
use crate::graph::Aggregate;
use crate::rule::ModelKind;
use crate::validate::{SchemaErrors, validate_document};

/// A schema document that passed validation.
///
/// There is no partially valid schema: [`ApplicationSchema::build`] either
/// returns a schema or every error found.
#[derive(Debug, Clone)]
pub struct ApplicationSchema {
    ctx: Arc<SchemaParseContext>,
}

impl ApplicationSchema {
    /// Validates the context's document.
    ///
    /// # Errors
    ///
    /// Returns all validation errors, grouped per node, if there are any.
    pub fn build(ctx: Arc<SchemaParseContext>) -> Result<Self, SchemaErrors> {
        debug!(document = ctx.document().name(), nodes = ctx.document().len(), "Validating schema");
        let errors = validate_document(&ctx);
        if !errors.is_empty() {
            debug!(
                errors = errors.len(),
                nodes = errors.nodes().len(),
                "Schema validation failed"
            );
            return Err(errors);
        }

        let schema = Self { ctx };
        info!(
            document = schema.ctx.document().name(),
            roots = schema.ctx.document().top_level().len(),
            aggregates = schema.all_aggregates().len(),
            "Schema validated"
        );
        Ok(schema)
    }

    pub fn context(&self) -> &Arc<SchemaParseContext> {
        &self.ctx
    }

    /// Root aggregates in document order.
    pub fn root_aggregates(&self) -> Vec<Aggregate> {
        self.ctx
            .document()
            .top_level()
            .iter()
            .filter_map(|id| Aggregate::entry(&self.ctx, *id))
            .collect()
    }

    /// Root aggregates declared with `model`.
    pub fn roots_of(&self, model: ModelKind) -> Vec<Aggregate> {
        self.root_aggregates()
            .into_iter()
            .filter(|a| a.model() == Some(model))
            .collect()
    }

    /// Root aggregate with the given physical name.
    pub fn find_root(&self, name: &str) -> Option<Aggregate> {
        self.root_aggregates()
            .into_iter()
            .find(|a| a.physical_name() == name)
    }

    /// Every aggregate, each root followed by its descendants.
    pub fn all_aggregates(&self) -> Vec<Aggregate> {
        self.root_aggregates()
            .iter()
            .flat_map(Aggregate::this_and_descendants)
            .collect()
    }
}

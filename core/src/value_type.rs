//! Registry of value-member types.
//!
//! Builtin types are named directly in the discriminator (`Type="word"`).
//! Enumerations and value objects are named by the root that declares them
//! and are resolved per document by the parse context.

use std::fmt;

use crate::context::SchemaParseContext;
use crate::document::NodeId;
use crate::options::NodeOption;
use crate::validate::ValidationError;

/// Scalar type of a value member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueMemberType {
    Word,
    Description,
    Integer,
    Decimal,
    Date,
    DateTime,
    YearMonth,
    Year,
    Boolean,
    ByteArray,
    /// An enumeration declared by an `enum` root of the same document.
    StaticEnum(String),
    /// A value object declared by a `value-object` root of the same document.
    ValueObject(String),
}

impl ValueMemberType {
    /// Every builtin type, in registry order.
    pub fn builtins() -> Vec<ValueMemberType> {
        vec![
            ValueMemberType::Word,
            ValueMemberType::Description,
            ValueMemberType::Integer,
            ValueMemberType::Decimal,
            ValueMemberType::Date,
            ValueMemberType::DateTime,
            ValueMemberType::YearMonth,
            ValueMemberType::Year,
            ValueMemberType::Boolean,
            ValueMemberType::ByteArray,
        ]
    }

    /// Name as written in a discriminator.
    pub fn schema_name(&self) -> &str {
        match self {
            ValueMemberType::Word => "word",
            ValueMemberType::Description => "description",
            ValueMemberType::Integer => "int",
            ValueMemberType::Decimal => "decimal",
            ValueMemberType::Date => "date",
            ValueMemberType::DateTime => "datetime",
            ValueMemberType::YearMonth => "yearmonth",
            ValueMemberType::Year => "year",
            ValueMemberType::Boolean => "bool",
            ValueMemberType::ByteArray => "bytearray",
            ValueMemberType::StaticEnum(name) | ValueMemberType::ValueObject(name) => name,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ValueMemberType::Word | ValueMemberType::Description)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueMemberType::Integer | ValueMemberType::Decimal)
    }

    /// Checks the type-specific options present on a value member.
    ///
    /// Errors are keyed by the attribute they concern.
    pub fn validate(
        &self,
        ctx: &SchemaParseContext,
        id: NodeId,
    ) -> Vec<(&'static str, ValidationError)> {
        let mut errors = Vec::new();
        let doc = ctx.document();

        for option in [NodeOption::MaxLength, NodeOption::CharacterType] {
            if doc.attribute(id, option.key()).is_some() && !self.is_text() {
                errors.push((option.key(), self.not_applicable(option)));
            }
        }
        if doc.attribute(id, NodeOption::TotalDigit.key()).is_some() && !self.is_numeric() {
            errors.push((
                NodeOption::TotalDigit.key(),
                self.not_applicable(NodeOption::TotalDigit),
            ));
        }
        if doc.attribute(id, NodeOption::DecimalPlace.key()).is_some()
            && *self != ValueMemberType::Decimal
        {
            errors.push((
                NodeOption::DecimalPlace.key(),
                self.not_applicable(NodeOption::DecimalPlace),
            ));
        }

        if *self == ValueMemberType::Decimal {
            let total = doc
                .attribute(id, NodeOption::TotalDigit.key())
                .and_then(|v| v.trim().parse::<u32>().ok());
            let places = doc
                .attribute(id, NodeOption::DecimalPlace.key())
                .and_then(|v| v.trim().parse::<u32>().ok());
            if let (Some(total), Some(places)) = (total, places) {
                if places > total {
                    errors.push((
                        NodeOption::DecimalPlace.key(),
                        ValidationError::DecimalPlaceExceedsTotal { places, total },
                    ));
                }
            }
        }

        errors
    }

    fn not_applicable(&self, option: NodeOption) -> ValidationError {
        ValidationError::OptionNotApplicableToType {
            option: option.key().to_string(),
            value_type: self.schema_name().to_string(),
        }
    }
}

impl fmt::Display for ValueMemberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.schema_name())
    }
}

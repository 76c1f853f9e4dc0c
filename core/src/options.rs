//! Recognized optional attributes.
//!
//! Every [`NodeOption`] knows its attribute name, where it may appear and how
//! to check its value. Anything the discriminator does not cover is expressed
//! through these options.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::NodeKind;
use crate::rule::ModelKind;
use crate::validate::ValidationError;

/// A recognized optional attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeOption {
    DisplayName,
    DbName,
    LatinName,
    IsKey,
    IsRequired,
    GenerateDefaultQueryModel,
    GenerateBatchUpdateCommand,
    IsReadOnly,
    HasLifeCycle,
    RefToObject,
    /// Integer value of an enumeration member (`key="1"`).
    EnumKey,
    MaxLength,
    CharacterType,
    TotalDigit,
    DecimalPlace,
    SequenceName,
}

impl NodeOption {
    pub const ALL: [NodeOption; 16] = [
        NodeOption::DisplayName,
        NodeOption::DbName,
        NodeOption::LatinName,
        NodeOption::IsKey,
        NodeOption::IsRequired,
        NodeOption::GenerateDefaultQueryModel,
        NodeOption::GenerateBatchUpdateCommand,
        NodeOption::IsReadOnly,
        NodeOption::HasLifeCycle,
        NodeOption::RefToObject,
        NodeOption::EnumKey,
        NodeOption::MaxLength,
        NodeOption::CharacterType,
        NodeOption::TotalDigit,
        NodeOption::DecimalPlace,
        NodeOption::SequenceName,
    ];

    /// Attribute name as written in the document.
    pub fn key(self) -> &'static str {
        match self {
            NodeOption::DisplayName => "DisplayName",
            NodeOption::DbName => "DbName",
            NodeOption::LatinName => "LatinName",
            NodeOption::IsKey => "IsKey",
            NodeOption::IsRequired => "IsRequired",
            NodeOption::GenerateDefaultQueryModel => "GenerateDefaultQueryModel",
            NodeOption::GenerateBatchUpdateCommand => "GenerateBatchUpdateCommand",
            NodeOption::IsReadOnly => "IsReadOnly",
            NodeOption::HasLifeCycle => "HasLifeCycle",
            NodeOption::RefToObject => "RefToObject",
            NodeOption::EnumKey => "key",
            NodeOption::MaxLength => "MaxLength",
            NodeOption::CharacterType => "CharacterType",
            NodeOption::TotalDigit => "TotalDigit",
            NodeOption::DecimalPlace => "DecimalPlace",
            NodeOption::SequenceName => "SequenceName",
        }
    }

    /// Checks whether the option may appear on a node of `kind` owned by
    /// `model`. The error is a short reason phrase.
    pub fn availability(self, model: Option<ModelKind>, kind: NodeKind) -> Result<(), &'static str> {
        let member = matches!(kind, NodeKind::ValueMember | NodeKind::Reference);
        let allowed = match self {
            NodeOption::DisplayName => true,
            NodeOption::DbName | NodeOption::LatinName => kind != NodeKind::EnumValue,
            NodeOption::IsKey => {
                member && matches!(model, Some(ModelKind::DataModel | ModelKind::QueryModel))
            }
            NodeOption::IsRequired => member,
            NodeOption::GenerateDefaultQueryModel | NodeOption::GenerateBatchUpdateCommand => {
                kind == NodeKind::Root && model == Some(ModelKind::DataModel)
            }
            NodeOption::IsReadOnly => model == Some(ModelKind::QueryModel),
            NodeOption::HasLifeCycle => {
                kind.is_aggregate() && model == Some(ModelKind::QueryModel)
            }
            NodeOption::RefToObject => {
                kind == NodeKind::Reference && model == Some(ModelKind::CommandModel)
            }
            NodeOption::EnumKey => kind == NodeKind::EnumValue,
            NodeOption::MaxLength
            | NodeOption::CharacterType
            | NodeOption::TotalDigit
            | NodeOption::DecimalPlace => kind == NodeKind::ValueMember,
            NodeOption::SequenceName => {
                kind == NodeKind::ValueMember && model == Some(ModelKind::DataModel)
            }
        };
        if allowed {
            return Ok(());
        }
        Err(match self {
            NodeOption::IsKey => "only on members of data or query models",
            NodeOption::IsRequired => "only on value members and references",
            NodeOption::GenerateDefaultQueryModel | NodeOption::GenerateBatchUpdateCommand => {
                "only on data-model roots"
            }
            NodeOption::IsReadOnly | NodeOption::HasLifeCycle => "only in query models",
            NodeOption::RefToObject => "only on references in command models",
            NodeOption::EnumKey => "only on enum values",
            NodeOption::SequenceName => "only on value members of data models",
            NodeOption::DbName | NodeOption::LatinName => "on any node except enum values",
            _ => "only on value members",
        })
    }

    /// Checks the option's value in isolation.
    pub fn validate(self, value: &str) -> Vec<ValidationError> {
        let reason = match self {
            NodeOption::DisplayName | NodeOption::DbName | NodeOption::LatinName => {
                if value.contains(['\n', '\r']) {
                    Some("line breaks are not allowed")
                } else if self == NodeOption::LatinName && value.trim().is_empty() {
                    Some("cannot be empty")
                } else {
                    None
                }
            }
            NodeOption::IsKey
            | NodeOption::IsRequired
            | NodeOption::GenerateDefaultQueryModel
            | NodeOption::GenerateBatchUpdateCommand
            | NodeOption::IsReadOnly
            | NodeOption::HasLifeCycle => {
                parse_flag(value).is_none().then_some("expected True or False")
            }
            NodeOption::RefToObject => RefToObject::parse(value)
                .is_none()
                .then_some("expected DisplayData or SearchCondition"),
            NodeOption::EnumKey => value
                .trim()
                .parse::<i64>()
                .is_err()
                .then_some("expected an integer"),
            NodeOption::MaxLength | NodeOption::TotalDigit | NodeOption::DecimalPlace => value
                .trim()
                .parse::<u32>()
                .is_err()
                .then_some("expected a non-negative integer"),
            NodeOption::CharacterType | NodeOption::SequenceName => None,
        };

        reason
            .map(|reason| ValidationError::InvalidOptionValue {
                option: self.key().to_string(),
                reason: reason.to_string(),
            })
            .into_iter()
            .collect()
    }
}

impl fmt::Display for NodeOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Parses a boolean flag attribute.
///
/// ```
/// use aggregate_schema_core::parse_flag;
///
/// assert_eq!(parse_flag("True"), Some(true));
/// assert_eq!(parse_flag("0"), Some(false));
/// assert_eq!(parse_flag("yes"), None);
/// ```
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "True" | "true" | "1" => Some(true),
        "False" | "false" | "0" => Some(false),
        _ => None,
    }
}

/// Downstream role of a reference declared in a command model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefToObject {
    /// The reference carries the target's display data (a result).
    DisplayData,
    /// The reference carries the target's search condition (a filter).
    SearchCondition,
}

impl RefToObject {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "DisplayData" => Some(RefToObject::DisplayData),
            "SearchCondition" => Some(RefToObject::SearchCondition),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_unique() {
        let mut keys: Vec<&str> = NodeOption::ALL.iter().map(|o| o.key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), NodeOption::ALL.len());
    }

    #[test]
    fn test_flag_values() {
        assert!(NodeOption::IsKey.validate("True").is_empty());
        assert!(NodeOption::IsKey.validate("false").is_empty());
        let errors = NodeOption::IsKey.validate("maybe");
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::InvalidOptionValue { option, .. }] if option == "IsKey"
        ));
    }

    #[test]
    fn test_names_reject_line_breaks() {
        assert!(NodeOption::DisplayName.validate("Customer name").is_empty());
        assert_eq!(NodeOption::DbName.validate("a\nb").len(), 1);
        assert_eq!(NodeOption::LatinName.validate("  ").len(), 1);
    }

    #[test]
    fn test_numeric_values() {
        assert!(NodeOption::MaxLength.validate("40").is_empty());
        assert_eq!(NodeOption::MaxLength.validate("-1").len(), 1);
        assert!(NodeOption::EnumKey.validate("-1").is_empty());
        assert_eq!(NodeOption::EnumKey.validate("one").len(), 1);
    }

    #[test]
    fn test_ref_to_object_values() {
        assert!(NodeOption::RefToObject.validate("SearchCondition").is_empty());
        assert_eq!(NodeOption::RefToObject.validate("Entity").len(), 1);
        assert_eq!(RefToObject::parse("DisplayData"), Some(RefToObject::DisplayData));
    }

    #[test]
    fn test_availability() {
        let dm = Some(ModelKind::DataModel);
        let cm = Some(ModelKind::CommandModel);
        assert!(NodeOption::IsKey.availability(dm, NodeKind::ValueMember).is_ok());
        assert!(NodeOption::IsKey.availability(cm, NodeKind::ValueMember).is_err());
        assert!(NodeOption::IsKey.availability(dm, NodeKind::NestedOne).is_err());
        assert!(NodeOption::GenerateDefaultQueryModel.availability(dm, NodeKind::Root).is_ok());
        assert!(
            NodeOption::GenerateDefaultQueryModel
                .availability(dm, NodeKind::NestedMany)
                .is_err()
        );
        assert!(NodeOption::RefToObject.availability(cm, NodeKind::Reference).is_ok());
        assert!(NodeOption::RefToObject.availability(dm, NodeKind::Reference).is_err());
        assert!(NodeOption::EnumKey.availability(Some(ModelKind::StaticEnum), NodeKind::EnumValue).is_ok());
        assert!(NodeOption::DisplayName.availability(None, NodeKind::Unknown).is_ok());
        assert!(NodeOption::DbName.availability(Some(ModelKind::StaticEnum), NodeKind::EnumValue).is_err());
    }
}

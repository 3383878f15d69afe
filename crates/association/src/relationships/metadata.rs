//! Association Metadata - Immutable configuration for singular associations

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, ModelResult};
use crate::model::Model;

use super::belongs_to::BelongsTo;
use super::has_one::HasOne;
use super::traits::ReplaceStrategy;

/// The kind of singular association
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    /// The target row holds the foreign key pointing at the owner
    HasOne,
    /// The owner row holds the foreign key pointing at the target
    BelongsTo,
}

impl AssociationKind {
    /// Returns true if the owner carries the foreign key column
    pub fn owner_holds_key(self) -> bool {
        matches!(self, Self::BelongsTo)
    }
}

/// Configuration describing how to find and assign an association's target.
///
/// Definitions are built once per association and shared by every proxy of
/// that association through an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationDefinition {
    /// The kind of association
    pub kind: AssociationKind,

    /// Name of the association (accessor name on the owner)
    pub name: String,

    /// The target model's table name
    pub related_table: String,

    /// The target model's type name
    pub related_model: String,

    /// Foreign key column; on the owner for `BelongsTo`, on the target for `HasOne`
    pub foreign_key: String,

    /// Key on the owner referenced by a `HasOne` foreign key
    #[serde(default = "default_key")]
    pub local_key: String,

    /// Identifying key of the target model
    #[serde(default = "default_key")]
    pub primary_key: String,

    /// Name of the inverse association on the target, if any
    #[serde(default)]
    pub inverse: Option<String>,

    /// Additional constraints applied when fetching the target
    #[serde(default)]
    pub constraints: Vec<RelationshipConstraint>,
}

fn default_key() -> String {
    "id".to_string()
}

impl AssociationDefinition {
    /// Create a new definition with default keys
    pub fn new(
        kind: AssociationKind,
        name: impl Into<String>,
        related_table: impl Into<String>,
        related_model: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            related_table: related_table.into(),
            related_model: related_model.into(),
            foreign_key: foreign_key.into(),
            local_key: default_key(),
            primary_key: default_key(),
            inverse: None,
            constraints: Vec::new(),
        }
    }

    /// Shorthand for a `HasOne` definition
    pub fn has_one(
        name: impl Into<String>,
        related_table: impl Into<String>,
        related_model: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::new(AssociationKind::HasOne, name, related_table, related_model, foreign_key)
    }

    /// Shorthand for a `BelongsTo` definition
    pub fn belongs_to(
        name: impl Into<String>,
        related_table: impl Into<String>,
        related_model: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::new(AssociationKind::BelongsTo, name, related_table, related_model, foreign_key)
    }

    /// Set the owner key referenced by the foreign key
    pub fn with_local_key(mut self, local_key: impl Into<String>) -> Self {
        self.local_key = local_key.into();
        self
    }

    /// Set the target's identifying key
    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    /// Set the inverse association name
    pub fn with_inverse(mut self, inverse: impl Into<String>) -> Self {
        self.inverse = Some(inverse.into());
        self
    }

    /// Add a constraint to the fetch scope
    pub fn with_constraint(mut self, constraint: RelationshipConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Validate the definition for consistency
    pub fn validate(&self) -> ModelResult<()> {
        let required = [
            ("name", &self.name),
            ("related table", &self.related_table),
            ("related model", &self.related_model),
            ("foreign key", &self.foreign_key),
            ("local key", &self.local_key),
            ("primary key", &self.primary_key),
        ];

        for (label, value) in required {
            if value.is_empty() {
                return Err(ModelError::Configuration(format!(
                    "Association '{}' must specify a {}",
                    self.name, label
                )));
            }
        }

        if let Some(inverse) = &self.inverse {
            if inverse.is_empty() {
                return Err(ModelError::Configuration(format!(
                    "Association '{}' has an empty inverse name",
                    self.name
                )));
            }
        }

        for constraint in &self.constraints {
            constraint.validate()?;
        }

        Ok(())
    }

    /// Returns true if fetched and assigned targets get their inverse set
    pub fn has_inverse(&self) -> bool {
        self.inverse.is_some()
    }

    /// The replace strategy matching this definition's kind
    pub fn default_strategy<Owner, Target>(&self) -> Arc<dyn ReplaceStrategy<Owner, Target>>
    where
        Owner: Model + 'static,
        Target: Model + 'static,
    {
        match self.kind {
            AssociationKind::HasOne => Arc::new(HasOne),
            AssociationKind::BelongsTo => Arc::new(BelongsTo),
        }
    }
}

/// Relationship constraint for additional filtering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipConstraint {
    /// The column to constrain
    pub column: String,

    /// The constraint operator
    pub operator: ConstraintOperator,

    /// The constraint value
    #[serde(default)]
    pub value: Value,
}

impl RelationshipConstraint {
    pub fn new(column: impl Into<String>, operator: ConstraintOperator, value: Value) -> Self {
        Self {
            column: column.into(),
            operator,
            value,
        }
    }

    /// Equality constraint
    pub fn equals(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, ConstraintOperator::Equal, value.into())
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.column.is_empty() {
            return Err(ModelError::Configuration(
                "Constraint column cannot be empty".to_string(),
            ));
        }

        if self.operator.takes_list() && !self.value.is_array() {
            return Err(ModelError::Configuration(format!(
                "Constraint on '{}' with {} requires a list value",
                self.column,
                self.operator.to_sql()
            )));
        }

        Ok(())
    }
}

/// Constraint operators for relationship constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintOperator {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    In,
    NotIn,
    Like,
    IsNull,
    IsNotNull,
}

impl ConstraintOperator {
    /// Convert the operator to its SQL representation
    pub fn to_sql(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThanOrEqual => "<=",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Like => "LIKE",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }

    pub fn takes_list(&self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }

    /// Operators that bind no value
    pub fn is_unary(&self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_definition_defaults() {
        let definition = AssociationDefinition::has_one("profile", "profiles", "Profile", "user_id");

        assert_eq!(definition.kind, AssociationKind::HasOne);
        assert_eq!(definition.local_key, "id");
        assert_eq!(definition.primary_key, "id");
        assert!(!definition.has_inverse());
        assert!(definition.validate().is_ok());
        assert!(!definition.kind.owner_holds_key());
        assert!(AssociationKind::BelongsTo.owner_holds_key());
    }

    #[test]
    fn test_definition_builder_pattern() {
        let definition = AssociationDefinition::belongs_to("author", "users", "User", "author_id")
            .with_primary_key("uuid")
            .with_local_key("uuid")
            .with_inverse("posts")
            .with_constraint(RelationshipConstraint::equals("active", true));

        assert_eq!(definition.primary_key, "uuid");
        assert_eq!(definition.inverse.as_deref(), Some("posts"));
        assert_eq!(definition.constraints.len(), 1);
        assert!(definition.validate().is_ok());
    }

    #[test]
    fn test_definition_validation() {
        let missing_key = AssociationDefinition::has_one("profile", "profiles", "Profile", "");
        assert!(matches!(missing_key.validate(), Err(ModelError::Configuration(_))));

        let empty_inverse = AssociationDefinition::has_one("profile", "profiles", "Profile", "user_id")
            .with_inverse("");
        assert!(empty_inverse.validate().is_err());

        let bad_constraint = AssociationDefinition::has_one("profile", "profiles", "Profile", "user_id")
            .with_constraint(RelationshipConstraint::new(
                "kind",
                ConstraintOperator::In,
                json!("primary"),
            ));
        assert!(bad_constraint.validate().is_err());
    }

    #[test]
    fn test_definition_deserializes_with_defaults() {
        let definition: AssociationDefinition = serde_json::from_value(json!({
            "kind": "belongs_to",
            "name": "author",
            "related_table": "users",
            "related_model": "User",
            "foreign_key": "author_id",
            "inverse": "posts"
        }))
        .unwrap();

        assert_eq!(definition.kind, AssociationKind::BelongsTo);
        assert_eq!(definition.primary_key, "id");
        assert!(definition.constraints.is_empty());
        assert!(definition.has_inverse());
    }

    #[test]
    fn test_constraint_operator_sql() {
        assert_eq!(ConstraintOperator::Equal.to_sql(), "=");
        assert_eq!(ConstraintOperator::In.to_sql(), "IN");
        assert_eq!(ConstraintOperator::IsNull.to_sql(), "IS NULL");
        assert!(ConstraintOperator::IsNotNull.is_unary());
        assert!(ConstraintOperator::NotIn.takes_list());
    }
}

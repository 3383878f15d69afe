//! BelongsTo - the owner row holds the foreign key

use serde_json::Value;

use crate::error::ModelResult;
use crate::model::Model;

use super::metadata::AssociationDefinition;
use super::scope::AssociationScope;
use super::traits::ReplaceStrategy;

/// Foreign-key-held strategy: `owner.<foreign_key>` names the target's key.
///
/// Tracks staleness on the owner's foreign key, so reassigning the column
/// directly makes the next read refetch.
#[derive(Debug, Clone, Copy, Default)]
pub struct BelongsTo;

impl BelongsTo {
    fn foreign_key_value<Owner: Model>(owner: &Owner, definition: &AssociationDefinition) -> Value {
        owner.field(&definition.foreign_key).unwrap_or(Value::Null)
    }
}

impl<Owner, Target> ReplaceStrategy<Owner, Target> for BelongsTo
where
    Owner: Model,
    Target: Model,
{
    fn name(&self) -> &'static str {
        "belongs_to"
    }

    fn scope(&self, owner: &Owner, definition: &AssociationDefinition) -> AssociationScope {
        AssociationScope::new(&definition.related_table, &definition.primary_key)
            .where_eq(&definition.primary_key, Self::foreign_key_value(owner, definition))
            .with_constraints(&definition.constraints)
    }

    fn stale_state(&self, owner: &Owner, definition: &AssociationDefinition) -> Option<Value> {
        Some(Self::foreign_key_value(owner, definition))
    }

    fn replace(
        &self,
        owner: &mut Owner,
        record: Option<&mut Target>,
        definition: &AssociationDefinition,
    ) -> ModelResult<()> {
        let key = record
            .and_then(|record| record.field(&definition.primary_key))
            .unwrap_or(Value::Null);
        owner.set_field(&definition.foreign_key, key)
    }
}

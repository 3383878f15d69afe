//! HasOne - the target row holds the foreign key

use serde_json::Value;

use crate::error::ModelResult;
use crate::model::Model;

use super::metadata::AssociationDefinition;
use super::scope::AssociationScope;
use super::traits::ReplaceStrategy;

/// Owned strategy: `target.<foreign_key>` points back at `owner.<local_key>`.
///
/// The owner carries no column for this association, so nothing on it can
/// make the cached target stale.
#[derive(Debug, Clone, Copy, Default)]
pub struct HasOne;

impl HasOne {
    fn owner_key<Owner: Model>(owner: &Owner, definition: &AssociationDefinition) -> Value {
        owner.field(&definition.local_key).unwrap_or(Value::Null)
    }
}

impl<Owner, Target> ReplaceStrategy<Owner, Target> for HasOne
where
    Owner: Model,
    Target: Model,
{
    fn name(&self) -> &'static str {
        "has_one"
    }

    fn scope(&self, owner: &Owner, definition: &AssociationDefinition) -> AssociationScope {
        AssociationScope::new(&definition.related_table, &definition.primary_key)
            .where_eq(&definition.foreign_key, Self::owner_key(owner, definition))
            .with_constraints(&definition.constraints)
    }

    fn replace(
        &self,
        owner: &mut Owner,
        record: Option<&mut Target>,
        definition: &AssociationDefinition,
    ) -> ModelResult<()> {
        match record {
            Some(record) => record.set_field(&definition.foreign_key, Self::owner_key(owner, definition)),
            None => Ok(()),
        }
    }
}

//! Association Traits - Collaborator contracts consumed by singular associations

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, ModelResult};
use crate::model::Model;

use super::metadata::AssociationDefinition;
use super::scope::AssociationScope;

/// Attribute map handed to record builders
pub type Attributes = HashMap<String, Value>;

/// Outcome of fetching an association's target
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    /// The first record matching the scope
    Found(T),
    /// The scope matched no rows
    Empty,
    /// A strict lookup failed; the association resets instead of caching absence
    NotFound,
}

impl<T> FetchOutcome<T> {
    /// Map a strict lookup result, turning `ModelError::NotFound` into `NotFound`
    pub fn from_lookup(result: ModelResult<T>) -> ModelResult<Self> {
        match result {
            Ok(record) => Ok(Self::Found(record)),
            Err(ModelError::NotFound(_)) => Ok(Self::NotFound),
            Err(err) => Err(err),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

impl<T> From<Option<T>> for FetchOutcome<T> {
    fn from(record: Option<T>) -> Self {
        match record {
            Some(record) => Self::Found(record),
            None => Self::Empty,
        }
    }
}

/// Runs association scopes against the target's record source
#[async_trait]
pub trait ScopeExecutor<Target>: Send + Sync {
    /// Fetch the first record matching `scope`.
    ///
    /// Executors that keep a result cache must skip it when
    /// `scope.is_uncached()` is set.
    async fn first(&self, scope: &AssociationScope) -> ModelResult<FetchOutcome<Target>>;
}

/// Persists records and keeps inverse associations in sync
#[async_trait]
pub trait RecordStore<Owner, Target>: Send + Sync {
    /// Save `record`. `Ok(false)` means validation or constraints rejected it;
    /// `Err` is reserved for failures of the store itself.
    async fn save(&self, record: &mut Target) -> ModelResult<bool>;

    /// Point the inverse association of `record` back at `owner`
    fn establish_inverse(&self, record: &mut Target, owner: &Owner, definition: &AssociationDefinition);
}

/// Options for record construction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Assign attributes without mass-assignment protection
    #[serde(default)]
    pub without_protection: bool,

    /// Mass-assignment role to build under
    #[serde(default)]
    pub role: Option<String>,
}

impl BuildOptions {
    pub fn without_protection() -> Self {
        Self {
            without_protection: true,
            role: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}

/// Constructs unsaved target records
pub trait RecordBuilder<Owner, Target>: Send + Sync {
    fn build(
        &self,
        definition: &AssociationDefinition,
        owner: &Owner,
        attributes: &Attributes,
        options: &BuildOptions,
    ) -> ModelResult<Target>;
}

/// Variant-specific behaviour of a singular association.
///
/// `replace` is abstract: a strategy that does not supply it reports
/// `ModelError::ReplaceNotImplemented` on every call.
pub trait ReplaceStrategy<Owner, Target>: Send + Sync {
    /// Label used in logs and errors
    fn name(&self) -> &'static str;

    /// Criteria that find the target for `owner`
    fn scope(&self, owner: &Owner, definition: &AssociationDefinition) -> AssociationScope;

    /// Snapshot of the owner attribute the cached target depends on.
    /// `None` disables staleness tracking.
    fn stale_state(&self, _owner: &Owner, _definition: &AssociationDefinition) -> Option<Value> {
        None
    }

    /// Update the owner's or the record's key attributes so that `record`
    /// (or nothing, for `None`) becomes the association's target
    fn replace(
        &self,
        _owner: &mut Owner,
        _record: Option<&mut Target>,
        _definition: &AssociationDefinition,
    ) -> ModelResult<()> {
        Err(ModelError::ReplaceNotImplemented {
            strategy: self.name().to_string(),
        })
    }
}

/// Collaborators shared by every proxy of an association
pub struct AssociationContext<Owner, Target> {
    pub executor: Arc<dyn ScopeExecutor<Target>>,
    pub store: Arc<dyn RecordStore<Owner, Target>>,
    pub builder: Arc<dyn RecordBuilder<Owner, Target>>,
}

impl<Owner, Target> AssociationContext<Owner, Target>
where
    Owner: Model,
    Target: Model,
{
    pub fn new(
        executor: Arc<dyn ScopeExecutor<Target>>,
        store: Arc<dyn RecordStore<Owner, Target>>,
        builder: Arc<dyn RecordBuilder<Owner, Target>>,
    ) -> Self {
        Self {
            executor,
            store,
            builder,
        }
    }
}

impl<Owner, Target> Clone for AssociationContext<Owner, Target> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            store: Arc::clone(&self.store),
            builder: Arc::clone(&self.builder),
        }
    }
}

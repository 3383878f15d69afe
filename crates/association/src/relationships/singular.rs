//! Singular Association - lazy, cached proxy for an owner's single related record
//!
//! The proxy starts unloaded. The first read runs the association scope
//! through the executor and caches the result, including a confirmed
//! absence. Later reads return the cache until it is reset, force-reloaded,
//! or the owner's key attribute drifts from the snapshot taken at load time.
//!
//! The owner is never stored. Every operation borrows it, so an owner can
//! hold its proxies by value without a reference cycle.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::{InvalidRecord, ModelError, ModelResult};
use crate::model::Model;

use super::metadata::AssociationDefinition;
use super::scope::AssociationScope;
use super::traits::{AssociationContext, Attributes, BuildOptions, FetchOutcome, ReplaceStrategy};

/// Lazy proxy for a has-one or belongs-to association
pub struct SingularAssociation<Owner, Target> {
    definition: Arc<AssociationDefinition>,
    strategy: Arc<dyn ReplaceStrategy<Owner, Target>>,
    context: AssociationContext<Owner, Target>,
    target: Option<Target>,
    loaded: bool,
    stale_state: Option<Value>,
}

impl<Owner, Target> SingularAssociation<Owner, Target>
where
    Owner: Model + 'static,
    Target: Model + 'static,
{
    /// Create an unloaded proxy using the strategy implied by the definition's kind
    pub fn new(definition: Arc<AssociationDefinition>, context: AssociationContext<Owner, Target>) -> Self {
        let strategy = definition.default_strategy();
        Self::with_strategy(definition, strategy, context)
    }

    /// Create an unloaded proxy with an explicit replace strategy
    pub fn with_strategy(
        definition: Arc<AssociationDefinition>,
        strategy: Arc<dyn ReplaceStrategy<Owner, Target>>,
        context: AssociationContext<Owner, Target>,
    ) -> Self {
        Self {
            definition,
            strategy,
            context,
            target: None,
            loaded: false,
            stale_state: None,
        }
    }

    pub fn definition(&self) -> &AssociationDefinition {
        &self.definition
    }

    /// Check if a fetch has completed (or a target was assigned) since the last reset
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// The cached target no longer matches the owner's key attribute
    pub fn is_stale(&self, owner: &Owner) -> bool {
        if !self.loaded {
            return false;
        }
        match &self.stale_state {
            Some(cached) => self.strategy.stale_state(owner, &self.definition).as_ref() != Some(cached),
            None => false,
        }
    }

    /// The criteria used to fetch this owner's target
    pub fn scope(&self, owner: &Owner) -> AssociationScope {
        self.strategy.scope(owner, &self.definition)
    }

    /// Read the target, fetching it when unloaded or stale.
    ///
    /// `force_reload` always refetches and asks the executor to skip its
    /// result cache. A missing target is `Ok(None)`, never an error.
    pub async fn reader(&mut self, owner: &Owner, force_reload: bool) -> ModelResult<Option<&Target>> {
        if force_reload {
            self.reset();
            self.load(owner, true).await?;
        } else if !self.loaded || self.is_stale(owner) {
            self.reset();
            self.load(owner, false).await?;
        } else {
            trace!(association = %self.definition.name, "association cache hit");
        }

        Ok(self.target.as_ref())
    }

    /// Assign `record` (or clear the association with `None`)
    pub fn writer(&mut self, owner: &mut Owner, record: Option<Target>) -> ModelResult<()> {
        self.replace(owner, record)
    }

    /// Build an unsaved target and make it the cached target
    pub fn build(&mut self, owner: &mut Owner, attributes: Attributes, options: BuildOptions) -> ModelResult<&Target> {
        self.build_with(owner, attributes, options, |_| {})
    }

    /// Like [`build`](Self::build), running `customize` on the record before it is cached
    pub fn build_with<F>(
        &mut self,
        owner: &mut Owner,
        attributes: Attributes,
        options: BuildOptions,
        customize: F,
    ) -> ModelResult<&Target>
    where
        F: FnOnce(&mut Target),
    {
        let mut record = self.build_record(owner, attributes, &options)?;
        customize(&mut record);
        self.set_new_record(owner, record)
    }

    /// Build, save and cache a target. A failed save still caches the record.
    pub async fn create(
        &mut self,
        owner: &mut Owner,
        attributes: Attributes,
        options: BuildOptions,
    ) -> ModelResult<&Target> {
        self.create_record(owner, attributes, options, |_| {}, false).await
    }

    pub async fn create_with<F>(
        &mut self,
        owner: &mut Owner,
        attributes: Attributes,
        options: BuildOptions,
        customize: F,
    ) -> ModelResult<&Target>
    where
        F: FnOnce(&mut Target) + Send,
    {
        self.create_record(owner, attributes, options, customize, false).await
    }

    /// Build, save and cache a target, returning `ModelError::RecordInvalid`
    /// if the save fails. The error carries a snapshot of the record's fields
    /// and validation errors; the invalid record itself stays cached, so read
    /// it back with [`reader`](Self::reader) to fix and resave it.
    pub async fn create_or_fail(
        &mut self,
        owner: &mut Owner,
        attributes: Attributes,
        options: BuildOptions,
    ) -> ModelResult<&Target> {
        self.create_record(owner, attributes, options, |_| {}, true).await
    }

    pub async fn create_or_fail_with<F>(
        &mut self,
        owner: &mut Owner,
        attributes: Attributes,
        options: BuildOptions,
        customize: F,
    ) -> ModelResult<&Target>
    where
        F: FnOnce(&mut Target) + Send,
    {
        self.create_record(owner, attributes, options, customize, true).await
    }

    /// Load the target if needed and return it.
    ///
    /// A strict not-found from the executor resets the proxy and yields `None`.
    pub async fn load_target(&mut self, owner: &Owner) -> ModelResult<Option<&Target>> {
        self.load(owner, false).await?;
        Ok(self.target.as_ref())
    }

    /// Discard the target and fetch it again
    pub async fn reload(&mut self, owner: &Owner) -> ModelResult<Option<&Target>> {
        self.reset();
        self.load_target(owner).await
    }

    /// Forget the cached target; the next read fetches
    pub fn reset(&mut self) {
        self.target = None;
        self.loaded = false;
        self.stale_state = None;
    }

    /// Cache a target fetched elsewhere (eager loading) without touching keys
    pub fn preload(&mut self, owner: &Owner, target: Option<Target>) {
        self.target = target;
        self.mark_loaded(owner);
    }

    async fn load(&mut self, owner: &Owner, uncached: bool) -> ModelResult<()> {
        if !self.loaded || self.is_stale(owner) {
            match self.find_target(owner, uncached).await? {
                FetchOutcome::Found(record) => self.target = Some(record),
                FetchOutcome::Empty => self.target = None,
                FetchOutcome::NotFound => {
                    debug!(
                        association = %self.definition.name,
                        "strict lookup found no target, resetting association"
                    );
                    self.reset();
                    return Ok(());
                }
            }
            self.mark_loaded(owner);
        }

        Ok(())
    }

    async fn find_target(&self, owner: &Owner, uncached: bool) -> ModelResult<FetchOutcome<Target>> {
        let mut scope = self.strategy.scope(owner, &self.definition);
        if uncached {
            scope = scope.uncached();
        }

        debug!(
            association = %self.definition.name,
            table = scope.table(),
            uncached,
            "fetching association target"
        );

        let mut outcome = self.context.executor.first(&scope).await?;
        if let FetchOutcome::Found(record) = &mut outcome {
            self.set_inverse_instance(record, owner);
        }

        Ok(outcome)
    }

    fn replace(&mut self, owner: &mut Owner, mut record: Option<Target>) -> ModelResult<()> {
        self.apply_replace(owner, record.as_mut())?;
        self.target = record;
        Ok(())
    }

    fn set_new_record(&mut self, owner: &mut Owner, mut record: Target) -> ModelResult<&Target> {
        self.apply_replace(owner, Some(&mut record))?;
        Ok(self.target.insert(record))
    }

    /// Key bookkeeping shared by every assignment; the caller stores the record
    fn apply_replace(&mut self, owner: &mut Owner, mut record: Option<&mut Target>) -> ModelResult<()> {
        self.strategy.replace(owner, record.as_deref_mut(), &self.definition)?;

        if let Some(record) = record.as_deref_mut() {
            self.set_inverse_instance(record, owner);
        }

        debug!(
            association = %self.definition.name,
            strategy = self.strategy.name(),
            present = record.is_some(),
            "replaced association target"
        );

        self.mark_loaded(owner);
        Ok(())
    }

    fn build_record(&self, owner: &Owner, mut attributes: Attributes, options: &BuildOptions) -> ModelResult<Target> {
        for (column, value) in self.scope(owner).attributes_for_create() {
            attributes.entry(column).or_insert(value);
        }
        self.context.builder.build(&self.definition, owner, &attributes, options)
    }

    async fn create_record<F>(
        &mut self,
        owner: &mut Owner,
        attributes: Attributes,
        options: BuildOptions,
        customize: F,
        raise_on_failure: bool,
    ) -> ModelResult<&Target>
    where
        F: FnOnce(&mut Target) + Send,
    {
        let mut record = self.build_record(owner, attributes, &options)?;
        customize(&mut record);

        let saved = self.context.store.save(&mut record).await?;
        if !saved {
            warn!(
                association = %self.definition.name,
                table = Target::table_name(),
                "association target failed to save"
            );
        }

        let record = self.set_new_record(owner, record)?;

        if !saved && raise_on_failure {
            return Err(ModelError::RecordInvalid(Box::new(InvalidRecord {
                table: Target::table_name().to_string(),
                fields: record.to_fields(),
                errors: record.validation_errors(),
            })));
        }

        Ok(record)
    }

    fn set_inverse_instance(&self, record: &mut Target, owner: &Owner) {
        if self.definition.has_inverse() {
            self.context.store.establish_inverse(record, owner, &self.definition);
        }
    }

    fn mark_loaded(&mut self, owner: &Owner) {
        self.loaded = true;
        self.stale_state = self.strategy.stale_state(owner, &self.definition);
    }
}

//! Association Registry - process-wide storage for association definitions

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::error::{ModelError, ModelResult};

use super::metadata::AssociationDefinition;

/// Thread-safe registry mapping (owner model, association name) to a shared definition
#[derive(Debug, Clone, Default)]
pub struct AssociationRegistry {
    definitions: Arc<DashMap<(String, String), Arc<AssociationDefinition>>>,
}

impl AssociationRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a definition for `owner_model`.
    ///
    /// Registering the same definition twice returns the existing `Arc`;
    /// registering a different definition under a taken name is an error.
    pub fn register(
        &self,
        owner_model: &str,
        definition: AssociationDefinition,
    ) -> ModelResult<Arc<AssociationDefinition>> {
        definition.validate()?;

        let key = (owner_model.to_string(), definition.name.clone());
        let entry = self
            .definitions
            .entry(key)
            .or_insert_with(|| Arc::new(definition.clone()));

        if **entry != definition {
            return Err(ModelError::Configuration(format!(
                "Association '{}' is already registered for {} with a different definition",
                definition.name, owner_model
            )));
        }

        tracing::debug!(
            owner = owner_model,
            association = %definition.name,
            kind = ?definition.kind,
            "registered association"
        );

        Ok(Arc::clone(&entry))
    }

    /// Get a definition by owner model and association name
    pub fn get(&self, owner_model: &str, name: &str) -> Option<Arc<AssociationDefinition>> {
        self.definitions
            .get(&(owner_model.to_string(), name.to_string()))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Get a definition or fail with a relationship error
    pub fn require(&self, owner_model: &str, name: &str) -> ModelResult<Arc<AssociationDefinition>> {
        self.get(owner_model, name).ok_or_else(|| {
            ModelError::Relationship(format!(
                "No association '{}' registered for {}",
                name, owner_model
            ))
        })
    }

    pub fn contains(&self, owner_model: &str, name: &str) -> bool {
        self.definitions
            .contains_key(&(owner_model.to_string(), name.to_string()))
    }

    /// All association names registered for a model, sorted
    pub fn names_for(&self, owner_model: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .definitions
            .iter()
            .filter(|entry| entry.key().0 == owner_model)
            .map(|entry| entry.key().1.clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

static GLOBAL_REGISTRY: Lazy<AssociationRegistry> = Lazy::new(AssociationRegistry::new);

/// Get the global association registry
pub fn global_registry() -> &'static AssociationRegistry {
    &GLOBAL_REGISTRY
}

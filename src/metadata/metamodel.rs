use super::EntityPersister;
use crate::core::{DbError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of entity persisters, shared by every session of a factory.
///
/// Immutable once built: `with_persister` returns a new `Metamodel`
/// (copy-on-write), so clones are cheap and never observe later additions.
#[derive(Clone, Default)]
pub struct Metamodel {
    persisters: Arc<HashMap<String, Arc<EntityPersister>>>,
}

impl Metamodel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_persister(self, persister: EntityPersister) -> Result<Self> {
        let name = persister.entity_name().to_string();

        if self.persisters.contains_key(&name) {
            return Err(DbError::MappingError(format!(
                "Entity '{}' is already mapped",
                name
            )));
        }

        let mut persisters = (*self.persisters).clone();
        persisters.insert(name, Arc::new(persister));

        Ok(Self {
            persisters: Arc::new(persisters),
        })
    }

    pub fn persister(&self, entity_name: &str) -> Result<&Arc<EntityPersister>> {
        self.persisters
            .get(entity_name)
            .ok_or_else(|| DbError::UnknownEntity(entity_name.to_string()))
    }

    pub fn contains(&self, entity_name: &str) -> bool {
        self.persisters.contains_key(entity_name)
    }

    pub fn entity_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.persisters.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.persisters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persisters.is_empty()
    }

    /// Checks that every association and hierarchy root points at a mapped entity.
    pub fn validate(&self) -> Result<()> {
        for persister in self.persisters.values() {
            if !self.contains(persister.root_entity_name()) {
                return Err(DbError::MappingError(format!(
                    "Entity '{}' declares unknown root '{}'",
                    persister.entity_name(),
                    persister.root_entity_name()
                )));
            }
            for property in persister.properties() {
                if let Some(target) = property.property_type.associated_entity()
                    && !self.contains(target)
                {
                    return Err(DbError::MappingError(format!(
                        "Association '{}.{}' targets unknown entity '{}'",
                        persister.entity_name(),
                        property.name,
                        target
                    )));
                }
            }
        }
        Ok(())
    }
}

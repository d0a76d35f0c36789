use super::journal::{Journal, RegistryChange, Savepoint};
use crate::core::{DbError, EntityCollection, Result};
use crate::entity::{
    CollectionEntry, CollectionKey, EntityEntry, EntityKey, EntityPtr, EntityRef,
    EntityRegistration,
};
use std::collections::HashMap;
use tracing::{Level, event};

/// Identity registry of one session.
///
/// Invariants:
/// - at most one instance per [`EntityKey`];
/// - at most one entry per instance (keyed by reference identity);
/// - every key maps to an instance whose entry carries that key.
#[derive(Debug, Default)]
pub struct PersistenceContext {
    entities_by_key: HashMap<EntityKey, EntityRef>,
    entries: HashMap<EntityPtr, EntityEntry>,
    collections: HashMap<CollectionKey, CollectionEntry>,
    journal: Journal,
}

impl PersistenceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails when `key` already belongs to an instance other than `entity`,
    /// or when `entity` is already managed under a different key.
    pub fn check_uniqueness(&self, key: &EntityKey, entity: &EntityRef) -> Result<()> {
        if let Some(existing) = self.entities_by_key.get(key)
            && !existing.ptr_eq(entity)
        {
            return Err(DbError::NonUniqueObject {
                entity_name: key.entity_name().to_string(),
                identifier: key.identifier().to_string(),
            });
        }
        self.check_identifier_unchanged(key, entity)
    }

    fn check_identifier_unchanged(&self, key: &EntityKey, entity: &EntityRef) -> Result<()> {
        match self.entries.get(&entity.ptr()) {
            Some(entry) if entry.key() != key => Err(DbError::InvalidIdentifier(format!(
                "identifier of a managed instance was altered from {} to {}",
                entry.key(),
                key
            ))),
            _ => Ok(()),
        }
    }

    /// Registers `entity` and returns its new entry.
    ///
    /// An instance that is already managed gets its entry replaced, so the
    /// registry never holds two records for one instance. Its key must stay
    /// the same; evict it first to bind it under another identifier.
    pub fn add_entity(
        &mut self,
        entity: &EntityRef,
        registration: EntityRegistration,
    ) -> Result<EntityEntry> {
        let persister = registration.key.persister().clone();

        if registration.loaded_state.len() != persister.property_count() {
            return Err(DbError::MappingError(format!(
                "Loaded state of {} has {} values, persister declares {}",
                registration.key,
                registration.loaded_state.len(),
                persister.property_count()
            )));
        }

        if !registration.options.skip_pre_insert_validation {
            for (property, value) in persister
                .properties()
                .iter()
                .zip(registration.loaded_state.iter())
            {
                property.validate(value)?;
            }
        }

        let key = registration.key.clone();
        self.check_identifier_unchanged(&key, entity)?;
        let entry = EntityEntry::new(entity.clone(), registration);

        let displaced = self.entities_by_key.insert(key.clone(), entity.clone());
        let previous = self.entries.insert(entity.ptr(), entry.clone());

        self.journal.record(RegistryChange::EntityAdded {
            entity: entity.clone(),
            key,
            previous,
            displaced,
        });

        Ok(entry)
    }

    /// Registers `collection` under `key` with a snapshot of its elements.
    ///
    /// Registering the same handle again refreshes its snapshot. A different
    /// handle under a managed key is refused, including when the owner itself
    /// swapped its collection, because the tracked handle is the one changes
    /// are detected against.
    pub fn add_collection(
        &mut self,
        key: CollectionKey,
        collection: &EntityCollection,
    ) -> Result<CollectionEntry> {
        if let Some(existing) = self.collections.get(&key)
            && !existing.collection().ptr_eq(collection)
        {
            return Err(DbError::NonUniqueCollection {
                role: key.role.clone(),
                owner: key.owner.to_string(),
            });
        }

        let entry = CollectionEntry::new(key.clone(), collection.clone(), collection.elements()?);
        let previous = self.collections.insert(key.clone(), entry.clone());
        self.journal
            .record(RegistryChange::CollectionAdded { key, previous });

        Ok(entry)
    }

    pub fn is_managed(&self, entity: &EntityRef) -> bool {
        self.entries.contains_key(&entity.ptr())
    }

    pub fn get_entry(&self, entity: &EntityRef) -> Option<&EntityEntry> {
        self.entries.get(&entity.ptr())
    }

    pub fn get_entity(&self, key: &EntityKey) -> Option<&EntityRef> {
        self.entities_by_key.get(key)
    }

    pub fn contains_key(&self, key: &EntityKey) -> bool {
        self.entities_by_key.contains_key(key)
    }

    pub fn get_collection(&self, key: &CollectionKey) -> Option<&CollectionEntry> {
        self.collections.get(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = &EntityEntry> {
        self.entries.values()
    }

    pub fn entity_count(&self) -> usize {
        self.entries.len()
    }

    pub fn collection_count(&self) -> usize {
        self.collections.len()
    }

    /// Drops the entry, key and owned collections of `entity`.
    ///
    /// Evictions are not journaled; rolling back a savepoint opened before an
    /// eviction does not bring the evicted entity back.
    pub fn remove_entity(&mut self, entity: &EntityRef) -> Option<EntityEntry> {
        let entry = self.entries.remove(&entity.ptr())?;
        self.entities_by_key.remove(entry.key());
        self.collections.retain(|key, _| &key.owner != entry.key());
        Some(entry)
    }

    pub fn clear(&mut self) {
        self.entities_by_key.clear();
        self.entries.clear();
        self.collections.clear();
    }

    pub fn savepoint(&mut self) -> Savepoint {
        self.journal.savepoint()
    }

    pub fn release(&mut self, savepoint: Savepoint) {
        self.journal.release(savepoint);
    }

    /// Undoes every registration made after `savepoint`.
    pub fn rollback_to(&mut self, savepoint: Savepoint) {
        let undone = self.journal.rollback_to(savepoint);
        event!(Level::DEBUG, changes = undone.len(), "registry rollback");

        for change in undone {
            match change {
                RegistryChange::EntityAdded {
                    entity,
                    key,
                    previous,
                    displaced,
                } => {
                    match displaced {
                        Some(displaced) => {
                            self.entities_by_key.insert(key, displaced);
                        }
                        None => {
                            self.entities_by_key.remove(&key);
                        }
                    }
                    match previous {
                        Some(previous) => {
                            self.entries.insert(entity.ptr(), previous);
                        }
                        None => {
                            self.entries.remove(&entity.ptr());
                        }
                    }
                }
                RegistryChange::CollectionAdded { key, previous } => match previous {
                    Some(previous) => {
                        self.collections.insert(key, previous);
                    }
                    None => {
                        self.collections.remove(&key);
                    }
                },
            }
        }
    }
}

use super::Savepoint;
use crate::core::{EntityCollection, Result};
use crate::entity::{CollectionEntry, CollectionKey, EntityEntry, EntityKey, EntityRef, EntityRegistration};
use crate::metadata::EntityPersister;
use std::sync::Arc;

/// Session capabilities needed to bind entities into a session.
///
/// Reassociation receives this explicitly instead of reaching for a session
/// through an event object. [`Session`](crate::session::Session) is the
/// production implementation.
pub trait ReassociationSource {
    /// Fails with `NonUniqueObject` when `key` is held by another instance.
    fn check_uniqueness(&self, key: &EntityKey, entity: &EntityRef) -> Result<()>;

    fn add_entity(
        &mut self,
        entity: &EntityRef,
        registration: EntityRegistration,
    ) -> Result<EntityEntry>;

    fn add_collection(
        &mut self,
        key: CollectionKey,
        collection: &EntityCollection,
    ) -> Result<CollectionEntry>;

    fn is_managed(&self, entity: &EntityRef) -> bool;

    fn persister_for(&self, entity_name: &str) -> Result<Arc<EntityPersister>>;

    fn savepoint(&mut self) -> Savepoint;

    fn rollback_to(&mut self, savepoint: Savepoint);

    fn release(&mut self, savepoint: Savepoint);
}

// ============================================================================
// Session
// ============================================================================
//
// A unit of work over a shared metamodel. The session exclusively owns its
// persistence context; every mutating call takes `&mut self`, which keeps
// registry access serialized without locks.
//
// ============================================================================

pub mod config;

pub use config::SessionConfig;

use crate::core::{DbError, EntityCollection, Result, Value};
use crate::engine::{PersistenceContext, ReassociationSource, Savepoint};
use crate::entity::{
    CollectionEntry, CollectionKey, EntityEntry, EntityKey, EntityRef, EntityRegistration,
    info_string,
};
use crate::event::Reassociator;
use crate::metadata::{EntityPersister, Metamodel};
use std::sync::Arc;
use tracing::{Level, event};
use uuid::Uuid;

pub struct Session {
    id: Uuid,
    metamodel: Arc<Metamodel>,
    config: SessionConfig,
    context: PersistenceContext,
}

impl Session {
    pub fn new(metamodel: Arc<Metamodel>, config: SessionConfig) -> Self {
        let id = Uuid::new_v4();
        event!(Level::DEBUG, session = %id, name = %config.name, "session opened");
        Self {
            id,
            metamodel,
            config,
            context: PersistenceContext::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn metamodel(&self) -> &Arc<Metamodel> {
        &self.metamodel
    }

    pub fn context(&self) -> &PersistenceContext {
        &self.context
    }

    /// Binds `entity` into this session using its own type and identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use memodb_session::{
    ///     DataType, EntityInstance, EntityPersister, Metamodel, PropertyDescriptor, Session,
    ///     SessionConfig,
    /// };
    /// use std::sync::Arc;
    ///
    /// # fn main() -> memodb_session::Result<()> {
    /// let user = EntityPersister::builder("User")
    ///     .property(PropertyDescriptor::scalar("name", DataType::Text))
    ///     .build()?;
    /// let metamodel = Arc::new(Metamodel::new().with_persister(user)?);
    /// let mut session = Session::new(metamodel, SessionConfig::default());
    ///
    /// let ada = EntityInstance::new("User").with_id(1).with("name", "Ada").into_ref();
    /// let entry = session.reassociate(&ada)?;
    /// assert_eq!(entry.key().to_string(), "[User#1]");
    /// # Ok(())
    /// # }
    /// ```
    pub fn reassociate(&mut self, entity: &EntityRef) -> Result<EntityEntry> {
        let entity_name = entity.entity_name()?;
        let persister = self.metamodel.persister(&entity_name)?.clone();
        let id = persister.get_identifier(entity)?.ok_or_else(|| {
            DbError::InvalidIdentifier(format!(
                "{} has no identifier",
                info_string(&entity_name, None)
            ))
        })?;
        self.reassociate_with(entity, &id, &persister)
    }

    /// Binds `entity` into this session under an explicit identifier and persister.
    pub fn reassociate_with(
        &mut self,
        entity: &EntityRef,
        id: &Value,
        persister: &Arc<EntityPersister>,
    ) -> Result<EntityEntry> {
        Reassociator::from_config(&self.config).reassociate(self, entity, id, persister)
    }

    pub fn entry(&self, entity: &EntityRef) -> Option<&EntityEntry> {
        self.context.get_entry(entity)
    }

    pub fn get(&self, key: &EntityKey) -> Option<&EntityRef> {
        self.context.get_entity(key)
    }

    pub fn contains(&self, entity: &EntityRef) -> bool {
        self.context.is_managed(entity)
    }

    pub fn contains_key(&self, key: &EntityKey) -> bool {
        self.context.contains_key(key)
    }

    pub fn collection_entry(&self, key: &CollectionKey) -> Option<&CollectionEntry> {
        self.context.get_collection(key)
    }

    pub fn entity_count(&self) -> usize {
        self.context.entity_count()
    }

    pub fn collection_count(&self) -> usize {
        self.context.collection_count()
    }

    /// Stops managing `entity`. Associated entities stay managed.
    pub fn evict(&mut self, entity: &EntityRef) -> Option<EntityEntry> {
        let evicted = self.context.remove_entity(entity);
        if let Some(entry) = &evicted {
            event!(Level::DEBUG, entity = %entry.key(), "entity evicted");
        }
        evicted
    }

    pub fn clear(&mut self) {
        self.context.clear();
    }
}

impl ReassociationSource for Session {
    fn check_uniqueness(&self, key: &EntityKey, entity: &EntityRef) -> Result<()> {
        self.context.check_uniqueness(key, entity)
    }

    fn add_entity(
        &mut self,
        entity: &EntityRef,
        registration: EntityRegistration,
    ) -> Result<EntityEntry> {
        self.context.add_entity(entity, registration)
    }

    fn add_collection(
        &mut self,
        key: CollectionKey,
        collection: &EntityCollection,
    ) -> Result<CollectionEntry> {
        self.context.add_collection(key, collection)
    }

    fn is_managed(&self, entity: &EntityRef) -> bool {
        self.context.is_managed(entity)
    }

    fn persister_for(&self, entity_name: &str) -> Result<Arc<EntityPersister>> {
        self.metamodel.persister(entity_name).cloned()
    }

    fn savepoint(&mut self) -> Savepoint {
        self.context.savepoint()
    }

    fn rollback_to(&mut self, savepoint: Savepoint) {
        self.context.rollback_to(savepoint)
    }

    fn release(&mut self, savepoint: Savepoint) {
        self.context.release(savepoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;
    use crate::entity::EntityInstance;
    use crate::metadata::PropertyDescriptor;

    fn session() -> Session {
        let user = EntityPersister::builder("User")
            .property(PropertyDescriptor::scalar("name", DataType::Text))
            .build()
            .unwrap();
        Session::new(
            Arc::new(Metamodel::new().with_persister(user).unwrap()),
            SessionConfig::default(),
        )
    }

    #[test]
    fn test_reassociate_requires_identifier() {
        let mut session = session();
        let user = EntityInstance::new("User").into_ref();
        assert!(matches!(
            session.reassociate(&user),
            Err(DbError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_reassociate_unknown_entity() {
        let mut session = session();
        let ghost = EntityInstance::new("Ghost").with_id(1).into_ref();
        assert!(matches!(
            session.reassociate(&ghost),
            Err(DbError::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_evict_and_clear() {
        let mut session = session();
        let a = EntityInstance::new("User").with_id(1).into_ref();
        let b = EntityInstance::new("User").with_id(2).into_ref();
        session.reassociate(&a).unwrap();
        session.reassociate(&b).unwrap();

        assert!(session.evict(&a).is_some());
        assert!(session.evict(&a).is_none());
        assert!(!session.contains(&a));
        assert!(session.contains(&b));

        session.clear();
        assert_eq!(session.entity_count(), 0);
    }
}

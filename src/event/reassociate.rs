use super::LockVisitor;
use crate::core::{Result, Value};
use crate::engine::{ReassociationSource, snapshot};
use crate::entity::{
    EntityEntry, EntityKey, EntityRef, EntityRegistration, EntityStatus, LockMode,
    RegistrationOptions, info_string,
};
use crate::metadata::EntityPersister;
use crate::session::SessionConfig;
use std::sync::Arc;
use tracing::{Level, event, info_span};

/// Binds transient or detached entities, and everything reachable from
/// them, into a session.
#[derive(Debug, Clone, Copy)]
pub struct Reassociator {
    atomic_graph: bool,
    max_graph_entities: Option<usize>,
}

impl Reassociator {
    pub fn new() -> Self {
        Self {
            atomic_graph: true,
            max_graph_entities: None,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            atomic_graph: config.atomic_graph_reassociation,
            max_graph_entities: config.max_graph_entities,
        }
    }

    /// When set (the default), a failure anywhere in the graph unregisters
    /// everything this call registered.
    pub fn atomic_graph(mut self, atomic: bool) -> Self {
        self.atomic_graph = atomic;
        self
    }

    pub fn max_graph_entities(mut self, limit: Option<usize>) -> Self {
        self.max_graph_entities = limit;
        self
    }

    /// Associates `entity` with the session behind `source` under `id`.
    ///
    /// The entity is registered as `Loaded` with a fresh snapshot and lock
    /// mode `None`, then every entity reachable through its associations is
    /// bound the same way. Returns the root entity's entry.
    ///
    /// # Errors
    /// `NonUniqueObject` when another instance already holds the identity;
    /// nothing is registered in that case. Errors from nested entities abort
    /// the whole call.
    pub fn reassociate<S>(
        &self,
        source: &mut S,
        entity: &EntityRef,
        id: &Value,
        persister: &Arc<EntityPersister>,
    ) -> Result<EntityEntry>
    where
        S: ReassociationSource + ?Sized,
    {
        let span = info_span!(
            "session.reassociate",
            entity = %info_string(persister.entity_name(), Some(id))
        );
        let _guard = span.enter();

        if !self.atomic_graph {
            return self.reassociate_graph(source, entity, id, persister);
        }

        let savepoint = source.savepoint();
        match self.reassociate_graph(source, entity, id, persister) {
            Ok(entry) => {
                source.release(savepoint);
                Ok(entry)
            }
            Err(err) => {
                event!(Level::WARN, error = %err, "reassociation rolled back");
                source.rollback_to(savepoint);
                Err(err)
            }
        }
    }

    fn reassociate_graph<S>(
        &self,
        source: &mut S,
        entity: &EntityRef,
        id: &Value,
        persister: &Arc<EntityPersister>,
    ) -> Result<EntityEntry>
    where
        S: ReassociationSource + ?Sized,
    {
        let entry = register(source, entity, id.clone(), persister)?;

        let bound = LockVisitor::new(source, id.clone(), entity.clone())
            .max_entities(self.max_graph_entities)
            .process(entity, persister)?;
        event!(Level::DEBUG, bound, "associations reassociated");

        Ok(entry)
    }
}

impl Default for Reassociator {
    fn default() -> Self {
        Self::new()
    }
}

/// Registers a single entity, without looking at its associations.
pub(crate) fn register<S>(
    source: &mut S,
    entity: &EntityRef,
    id: Value,
    persister: &Arc<EntityPersister>,
) -> Result<EntityEntry>
where
    S: ReassociationSource + ?Sized,
{
    event!(
        Level::DEBUG,
        entity = %info_string(persister.entity_name(), Some(&id)),
        "reassociating transient instance"
    );

    let key = EntityKey::new(id, persister.clone())?;
    source.check_uniqueness(&key, entity)?;

    let values = persister.get_property_values(entity)?;
    let loaded_state = snapshot::deep_copy(
        &values,
        &persister.property_types(),
        &persister.property_updateability(),
    )?;
    let version = snapshot::get_version(&loaded_state, persister);

    source.add_entity(
        entity,
        EntityRegistration {
            status: EntityStatus::Loaded,
            loaded_state,
            key,
            version,
            lock_mode: LockMode::None,
            options: RegistrationOptions::reassociated(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataType, DbError, EntityCollection, PropertyValue};
    use crate::engine::{PersistenceContext, Savepoint};
    use crate::entity::{CollectionEntry, CollectionKey, EntityInstance};
    use crate::metadata::PropertyDescriptor;

    /// Source that records the order of collaborator calls.
    #[derive(Default)]
    struct RecordingSource {
        context: PersistenceContext,
        calls: Vec<&'static str>,
        reject_all: bool,
    }

    impl ReassociationSource for RecordingSource {
        fn check_uniqueness(&self, key: &EntityKey, entity: &EntityRef) -> Result<()> {
            if self.reject_all {
                return Err(DbError::NonUniqueObject {
                    entity_name: key.entity_name().to_string(),
                    identifier: key.identifier().to_string(),
                });
            }
            self.context.check_uniqueness(key, entity)
        }

        fn add_entity(
            &mut self,
            entity: &EntityRef,
            registration: EntityRegistration,
        ) -> Result<EntityEntry> {
            self.calls.push("add_entity");
            self.context.add_entity(entity, registration)
        }

        fn add_collection(
            &mut self,
            key: CollectionKey,
            collection: &EntityCollection,
        ) -> Result<CollectionEntry> {
            self.calls.push("add_collection");
            self.context.add_collection(key, collection)
        }

        fn is_managed(&self, entity: &EntityRef) -> bool {
            self.context.is_managed(entity)
        }

        fn persister_for(&self, entity_name: &str) -> Result<Arc<EntityPersister>> {
            Err(DbError::UnknownEntity(entity_name.to_string()))
        }

        fn savepoint(&mut self) -> Savepoint {
            self.calls.push("savepoint");
            self.context.savepoint()
        }

        fn rollback_to(&mut self, savepoint: Savepoint) {
            self.calls.push("rollback");
            self.context.rollback_to(savepoint)
        }

        fn release(&mut self, savepoint: Savepoint) {
            self.calls.push("release");
            self.context.release(savepoint)
        }
    }

    fn user_persister() -> Arc<EntityPersister> {
        Arc::new(
            EntityPersister::builder("User")
                .property(PropertyDescriptor::scalar("name", DataType::Text))
                .version("version", DataType::Integer)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_registers_loaded_entry() {
        let mut source = RecordingSource::default();
        let persister = user_persister();
        let user = EntityInstance::new("User")
            .with_id(7)
            .with("name", "Grace")
            .with("version", 3)
            .into_ref();

        let entry = Reassociator::new()
            .reassociate(&mut source, &user, &Value::Integer(7), &persister)
            .unwrap();

        assert_eq!(entry.status(), EntityStatus::Loaded);
        assert_eq!(entry.lock_mode(), LockMode::None);
        assert_eq!(entry.version(), Some(&Value::Integer(3)));
        assert!(entry.exists_in_storage());
        assert!(!entry.lazy_properties_unfetched());
        assert_eq!(entry.key().to_string(), "[User#7]");
        assert_eq!(source.calls, vec!["savepoint", "add_entity", "release"]);
    }

    #[test]
    fn test_conflict_registers_nothing() {
        let mut source = RecordingSource {
            reject_all: true,
            ..Default::default()
        };
        let user = EntityInstance::new("User").with_id(1).into_ref();

        let err = Reassociator::new()
            .reassociate(&mut source, &user, &Value::Integer(1), &user_persister())
            .unwrap_err();

        assert!(err.is_non_unique_object());
        assert!(!source.calls.contains(&"add_entity"));
        assert_eq!(source.context.entity_count(), 0);
    }

    #[test]
    fn test_non_atomic_skips_savepoint() {
        let mut source = RecordingSource::default();
        let user = EntityInstance::new("User").with_id(1).into_ref();

        Reassociator::new()
            .atomic_graph(false)
            .reassociate(&mut source, &user, &Value::Integer(1), &user_persister())
            .unwrap();

        assert_eq!(source.calls, vec!["add_entity"]);
    }

    #[test]
    fn test_invalid_identifier_is_rejected_before_registration() {
        let mut source = RecordingSource::default();
        let user = EntityInstance::new("User").into_ref();

        let err = Reassociator::new()
            .reassociate(&mut source, &user, &Value::from("seven"), &user_persister())
            .unwrap_err();

        assert!(matches!(err, DbError::InvalidIdentifier(_)));
        assert_eq!(source.context.entity_count(), 0);
    }

    #[test]
    fn test_snapshot_is_taken_in_declared_order() {
        let mut source = RecordingSource::default();
        let user = EntityInstance::new("User")
            .with("version", 1)
            .with("name", "Ada")
            .into_ref();

        let entry = Reassociator::new()
            .reassociate(&mut source, &user, &Value::Integer(1), &user_persister())
            .unwrap();

        let state = entry.loaded_state();
        assert_eq!(state.get(0).and_then(PropertyValue::as_scalar), Some(&Value::from("Ada")));
        assert_eq!(state.get(1).and_then(PropertyValue::as_scalar), Some(&Value::Integer(1)));
    }
}

// ============================================================================
// Lock Visitor
// ============================================================================
//
// Propagates a reassociation across an object graph. Traversal is depth
// first over an explicit stack; a visited set keyed by reference identity
// makes every reachable entity visit exactly once, so cyclic graphs
// terminate.
//
// ============================================================================

use super::reassociate::register;
use crate::core::{DbError, PropertyValue, Result, Value};
use crate::engine::ReassociationSource;
use crate::entity::{CollectionKey, EntityKey, EntityPtr, EntityRef};
use crate::metadata::{EntityPersister, PropertyDescriptor};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{Level, event};

struct Frame {
    entity: EntityRef,
    key: EntityKey,
}

/// Walks the associations of a freshly reassociated entity and binds every
/// reachable entity the session does not manage yet.
pub struct LockVisitor<'a, S: ReassociationSource + ?Sized> {
    source: &'a mut S,
    owner_id: Value,
    owner: EntityRef,
    visited: HashSet<EntityPtr>,
    stack: Vec<Frame>,
    max_entities: Option<usize>,
    bound: usize,
}

impl<'a, S: ReassociationSource + ?Sized> LockVisitor<'a, S> {
    pub fn new(source: &'a mut S, owner_id: Value, owner: EntityRef) -> Self {
        Self {
            source,
            owner_id,
            owner,
            visited: HashSet::new(),
            stack: Vec::new(),
            max_entities: None,
            bound: 0,
        }
    }

    /// Caps the number of entities (owner included) one traversal may register.
    pub fn max_entities(mut self, limit: Option<usize>) -> Self {
        self.max_entities = limit;
        self
    }

    /// Traverses the graph rooted at `entity` and returns how many associated
    /// entities were bound. The root itself is expected to be registered.
    pub fn process(mut self, entity: &EntityRef, persister: &Arc<EntityPersister>) -> Result<usize> {
        let id = if entity.ptr_eq(&self.owner) {
            self.owner_id.clone()
        } else {
            persister.get_identifier(entity)?.ok_or_else(|| {
                DbError::InvalidIdentifier(format!(
                    "cannot traverse transient '{}' instance",
                    persister.entity_name()
                ))
            })?
        };

        self.visited.insert(entity.ptr());
        self.stack.push(Frame {
            entity: entity.clone(),
            key: EntityKey::new(id, persister.clone())?,
        });

        while let Some(frame) = self.stack.pop() {
            self.visit(frame)?;
        }

        Ok(self.bound)
    }

    fn visit(&mut self, frame: Frame) -> Result<()> {
        let persister = frame.key.persister().clone();
        // Values are copied out so no entity lock is held below.
        let values = persister.get_property_values(&frame.entity)?;

        for (property, value) in persister.properties().iter().zip(values) {
            match value {
                PropertyValue::Entity(target) => self.reach(&frame, property, target)?,
                PropertyValue::Collection(collection) => {
                    let key =
                        CollectionKey::new(persister.collection_role(property), frame.key.clone());
                    let entry = self.source.add_collection(key, &collection)?;
                    event!(
                        Level::DEBUG,
                        collection = %entry.key(),
                        elements = entry.snapshot().len(),
                        "collection reattached"
                    );

                    for element in entry.snapshot() {
                        self.reach(&frame, property, element.clone())?;
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn reach(&mut self, frame: &Frame, property: &PropertyDescriptor, target: EntityRef) -> Result<()> {
        let persister = self.source.persister_for(&target.entity_name()?)?;
        self.check_target_type(frame, property, &persister)?;

        if !self.visited.insert(target.ptr()) || self.source.is_managed(&target) {
            return Ok(());
        }

        if let Some(limit) = self.max_entities
            && self.bound + 1 >= limit
        {
            return Err(DbError::GraphTooLarge { limit });
        }

        let id = persister
            .get_identifier(&target)?
            .ok_or_else(|| DbError::TransientObject {
                entity_name: frame.key.entity_name().to_string(),
                property: property.name.clone(),
            })?;

        let entry = register(&mut *self.source, &target, id, &persister)?;
        self.bound += 1;
        self.stack.push(Frame {
            entity: target,
            key: entry.key().clone(),
        });

        Ok(())
    }

    /// An association accepts its declared entity and, when that entity is a
    /// hierarchy root, every entity of the hierarchy.
    fn check_target_type(
        &self,
        frame: &Frame,
        property: &PropertyDescriptor,
        target: &EntityPersister,
    ) -> Result<()> {
        let Some(declared) = property.property_type.associated_entity() else {
            return Ok(());
        };
        if target.entity_name() == declared {
            return Ok(());
        }

        let declared = self.source.persister_for(declared)?;
        if declared.entity_name() == declared.root_entity_name()
            && target.root_entity_name() == declared.entity_name()
        {
            return Ok(());
        }

        Err(DbError::MappingError(format!(
            "Association '{}.{}' expects {}, got {}",
            frame.key.entity_name(),
            property.name,
            declared.entity_name(),
            target.entity_name()
        )))
    }
}

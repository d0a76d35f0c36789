use crate::core::{DbError, Result, Value};
use crate::metadata::EntityPersister;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Human-readable identity of an entity, `[User#42]`.
pub fn info_string(entity_name: &str, identifier: Option<&Value>) -> String {
    match identifier {
        Some(id) => format!("[{}#{}]", entity_name, id),
        None => format!("[{}#<null>]", entity_name),
    }
}

/// Identity of a managed entity within a session: identifier plus persister.
///
/// Two keys are equal when their identifiers are equal and their persisters
/// share a hierarchy root, so a subclass instance and its root cannot both be
/// registered under the same identifier.
#[derive(Clone)]
pub struct EntityKey {
    identifier: Value,
    persister: Arc<EntityPersister>,
}

impl EntityKey {
    pub fn new(identifier: Value, persister: Arc<EntityPersister>) -> Result<Self> {
        if identifier.is_null() {
            return Err(DbError::InvalidIdentifier(format!(
                "null identifier for entity '{}'",
                persister.entity_name()
            )));
        }

        let expected = persister.identifier().data_type;
        if !expected.is_compatible(&identifier) {
            return Err(DbError::InvalidIdentifier(format!(
                "entity '{}' expects a {} identifier, got {}",
                persister.entity_name(),
                expected,
                identifier.type_name()
            )));
        }

        Ok(Self {
            identifier: expected.normalize(identifier),
            persister,
        })
    }

    pub fn identifier(&self) -> &Value {
        &self.identifier
    }

    pub fn persister(&self) -> &Arc<EntityPersister> {
        &self.persister
    }

    pub fn entity_name(&self) -> &str {
        self.persister.entity_name()
    }
}

impl PartialEq for EntityKey {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
            && self.persister.root_entity_name() == other.persister.root_entity_name()
    }
}

impl Eq for EntityKey {}

impl Hash for EntityKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.persister.root_entity_name().hash(state);
        self.identifier.hash(state);
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&info_string(self.entity_name(), Some(&self.identifier)))
    }
}

impl fmt::Debug for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityKey{}", self)
    }
}

/// Identity of a collection: its role and the key of the owning entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionKey {
    pub role: String,
    pub owner: EntityKey,
}

impl CollectionKey {
    pub fn new(role: impl Into<String>, owner: EntityKey) -> Self {
        Self {
            role: role.into(),
            owner,
        }
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}#{}]", self.role, self.owner.identifier())
    }
}

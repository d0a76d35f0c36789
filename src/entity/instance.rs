use crate::core::{PropertyValue, Result, Value};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Application-side entity object: a named bag of property values plus an
/// optional identifier. Unset fields read as null.
#[derive(Debug, Clone)]
pub struct EntityInstance {
    entity_name: String,
    id: Option<Value>,
    fields: HashMap<String, PropertyValue>,
}

impl EntityInstance {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            id: None,
            fields: HashMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn id(&self) -> Option<&Value> {
        self.id.as_ref()
    }

    pub fn set_id(&mut self, id: impl Into<Value>) {
        self.id = Some(id.into());
    }

    pub fn get(&self, field: &str) -> Option<&PropertyValue> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<PropertyValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn into_ref(self) -> EntityRef {
        EntityRef::new(self)
    }
}

/// Reference identity of an entity handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityPtr(usize);

/// Shared handle to an application-owned entity.
///
/// Equality and hashing follow reference identity, never field contents:
/// two handles are equal only when they point at the same instance.
#[derive(Clone)]
pub struct EntityRef(Arc<RwLock<EntityInstance>>);

impl EntityRef {
    pub fn new(instance: EntityInstance) -> Self {
        Self(Arc::new(RwLock::new(instance)))
    }

    pub fn ptr(&self) -> EntityPtr {
        EntityPtr(Arc::as_ptr(&self.0) as *const () as usize)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, EntityInstance>> {
        Ok(self.0.read()?)
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, EntityInstance>> {
        Ok(self.0.write()?)
    }

    pub fn entity_name(&self) -> Result<String> {
        Ok(self.read()?.entity_name().to_string())
    }

    pub fn id(&self) -> Result<Option<Value>> {
        Ok(self.read()?.id().cloned())
    }

    pub fn get(&self, field: &str) -> Result<Option<PropertyValue>> {
        Ok(self.read()?.get(field).cloned())
    }

    pub fn set(&self, field: impl Into<String>, value: impl Into<PropertyValue>) -> Result<()> {
        self.write()?.set(field, value);
        Ok(())
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for EntityRef {}

impl Hash for EntityRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ptr().hash(state);
    }
}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Fields are skipped on purpose: graphs may be cyclic.
        match self.0.try_read() {
            Ok(instance) => match instance.id() {
                Some(id) => write!(f, "EntityRef({}#{})", instance.entity_name(), id),
                None => write!(f, "EntityRef({}#<transient>)", instance.entity_name()),
            },
            Err(_) => write!(f, "EntityRef(<locked>)"),
        }
    }
}

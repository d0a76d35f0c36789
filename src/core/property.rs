// ============================================================================
// Property Values
// ============================================================================
//
// Values held by entity properties. Scalars are plain owned data; documents
// and collections are shared handles with reference identity, so two holders
// of the same handle observe each other's mutations. Snapshots rely on that
// distinction to decide what must be copied.
//
// ============================================================================

use super::{Result, Value};
use crate::entity::EntityRef;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Shared, mutable JSON document.
#[derive(Clone)]
pub struct Document(Arc<RwLock<serde_json::Value>>);

impl Document {
    pub fn new(value: serde_json::Value) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    /// Returns a copy of the current document contents.
    pub fn get(&self) -> Result<serde_json::Value> {
        Ok(self.0.read()?.clone())
    }

    /// Mutates the document in place. Every holder of this handle sees the change.
    pub fn update<R>(&self, f: impl FnOnce(&mut serde_json::Value) -> R) -> Result<R> {
        let mut guard = self.0.write()?;
        Ok(f(&mut guard))
    }

    /// New handle over an independent copy of the JSON tree.
    pub fn deep_copy(&self) -> Result<Self> {
        Ok(Self::new(self.get()?))
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_read() {
            Ok(doc) => write!(f, "Document({})", doc),
            Err(_) => write!(f, "Document(<locked>)"),
        }
    }
}

/// Shared, mutable collection of entity references.
#[derive(Clone, Default)]
pub struct EntityCollection(Arc<RwLock<Vec<EntityRef>>>);

impl EntityCollection {
    pub fn new(elements: Vec<EntityRef>) -> Self {
        Self(Arc::new(RwLock::new(elements)))
    }

    pub fn push(&self, element: EntityRef) -> Result<()> {
        self.0.write()?.push(element);
        Ok(())
    }

    /// Current element references, in insertion order.
    pub fn elements(&self) -> Result<Vec<EntityRef>> {
        Ok(self.0.read()?.clone())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.0.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// New collection handle holding the same element references.
    pub fn deep_copy(&self) -> Result<Self> {
        Ok(Self::new(self.elements()?))
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EntityCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Elements are not printed: they may point back at the owner.
        match self.0.try_read() {
            Ok(elements) => write!(f, "EntityCollection(len={})", elements.len()),
            Err(_) => write!(f, "EntityCollection(<locked>)"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum PropertyValue {
    Null,
    Scalar(Value),
    Document(Document),
    Entity(EntityRef),
    Collection(EntityCollection),
}

impl PropertyValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Scalar(_) => "scalar",
            Self::Document(_) => "document",
            Self::Entity(_) => "entity",
            Self::Collection(_) => "collection",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::Scalar(Value::Null))
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Self::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Self::Document(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&EntityRef> {
        match self {
            Self::Entity(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&EntityCollection> {
        match self {
            Self::Collection(c) => Some(c),
            _ => None,
        }
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            other => Self::Scalar(other),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Scalar(Value::from(s))
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        Self::Scalar(Value::Integer(i))
    }
}

impl From<i32> for PropertyValue {
    fn from(i: i32) -> Self {
        Self::Scalar(Value::from(i))
    }
}

impl From<Document> for PropertyValue {
    fn from(doc: Document) -> Self {
        Self::Document(doc)
    }
}

impl From<EntityRef> for PropertyValue {
    fn from(entity: EntityRef) -> Self {
        Self::Entity(entity)
    }
}

impl From<EntityCollection> for PropertyValue {
    fn from(collection: EntityCollection) -> Self {
        Self::Collection(collection)
    }
}

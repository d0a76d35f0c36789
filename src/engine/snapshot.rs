use crate::core::{DbError, PropertyValue, Result, Value};
use crate::metadata::{EntityPersister, PropertyType};

/// Loaded state of an entity, parallel to its persister's property list.
///
/// Updateable positions never share mutable state with the live entity, so
/// later changes to the entity leave the snapshot untouched.
#[derive(Debug, Clone, Default)]
pub struct Snapshot(Vec<PropertyValue>);

impl Snapshot {
    pub fn new(values: Vec<PropertyValue>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PropertyValue> {
        self.0.get(index)
    }

    pub fn values(&self) -> &[PropertyValue] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyValue> {
        self.0.iter()
    }
}

/// Copies `values` into a fresh snapshot.
///
/// Updateable positions are deep copies; the others are carried over as-is.
/// `values` itself is left untouched.
pub fn deep_copy(
    values: &[PropertyValue],
    types: &[&PropertyType],
    updateable: &[bool],
) -> Result<Snapshot> {
    if values.len() != types.len() || values.len() != updateable.len() {
        return Err(DbError::MappingError(format!(
            "Snapshot shape mismatch: {} values, {} types, {} updateability flags",
            values.len(),
            types.len(),
            updateable.len()
        )));
    }

    values
        .iter()
        .zip(types)
        .zip(updateable)
        .map(|((value, property_type), &updateable)| {
            if updateable {
                property_type.deep_copy(value)
            } else {
                Ok(value.clone())
            }
        })
        .collect::<Result<Vec<_>>>()
        .map(Snapshot)
}

/// Version value recorded in `snapshot`, if the persister declares one.
pub fn get_version(snapshot: &Snapshot, persister: &EntityPersister) -> Option<Value> {
    persister
        .version_index()
        .and_then(|index| snapshot.get(index))
        .and_then(PropertyValue::as_scalar)
        .filter(|version| !version.is_null())
        .cloned()
}

// ============================================================================
// Entity Persister
// ============================================================================
//
// Per-entity mapping metadata: identifier, ordered property list with
// updateability flags and the optional version property. The persister is
// also the value extractor for live entities: every snapshot is taken in
// persister-declared property order.
//
// ============================================================================

use super::{PropertyDescriptor, PropertyType};
use crate::core::{DataType, DbError, PropertyValue, Result, Value};
use crate::entity::EntityRef;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierDescriptor {
    pub name: String,
    pub data_type: DataType,
}

#[derive(Debug)]
pub struct EntityPersister {
    entity_name: String,
    root_entity_name: String,
    identifier: IdentifierDescriptor,
    properties: Vec<PropertyDescriptor>,
    version_index: Option<usize>,
}

impl EntityPersister {
    pub fn builder(entity_name: impl Into<String>) -> EntityPersisterBuilder {
        EntityPersisterBuilder::new(entity_name)
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Name of the hierarchy root; identities are unique per root.
    pub fn root_entity_name(&self) -> &str {
        &self.root_entity_name
    }

    pub fn identifier(&self) -> &IdentifierDescriptor {
        &self.identifier
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    pub fn property_index(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name == name)
    }

    pub fn property_types(&self) -> Vec<&PropertyType> {
        self.properties.iter().map(|p| &p.property_type).collect()
    }

    pub fn property_updateability(&self) -> Vec<bool> {
        self.properties.iter().map(|p| p.updateable).collect()
    }

    pub fn version_index(&self) -> Option<usize> {
        self.version_index
    }

    pub fn is_versioned(&self) -> bool {
        self.version_index.is_some()
    }

    /// Collection role for a property of this entity, e.g. `Order.lines`.
    pub fn collection_role(&self, property: &PropertyDescriptor) -> String {
        format!("{}.{}", self.entity_name, property.name)
    }

    /// Current property values of `entity`, one per declared property.
    ///
    /// Fails when the instance belongs to another entity type, carries fields
    /// this persister does not map, or holds a value of the wrong type.
    pub fn get_property_values(&self, entity: &EntityRef) -> Result<Vec<PropertyValue>> {
        let instance = entity.read()?;

        if instance.entity_name() != self.entity_name {
            return Err(DbError::MappingError(format!(
                "Instance of '{}' passed to persister for '{}'",
                instance.entity_name(),
                self.entity_name
            )));
        }

        if let Some(unknown) = instance
            .field_names()
            .find(|name| self.property_index(name).is_none())
        {
            return Err(DbError::MappingError(format!(
                "Property '{}' is not mapped on entity '{}'",
                unknown, self.entity_name
            )));
        }

        self.properties
            .iter()
            .map(|property| {
                let value = instance
                    .get(&property.name)
                    .cloned()
                    .unwrap_or(PropertyValue::Null);
                if !property.property_type.is_compatible(&value) {
                    return Err(DbError::MappingError(format!(
                        "Property '{}.{}' expects type {}, got {}",
                        self.entity_name,
                        property.name,
                        property.property_type,
                        value.kind()
                    )));
                }
                Ok(value)
            })
            .collect()
    }

    /// Identifier currently held by `entity`, `None` while it is unassigned.
    pub fn get_identifier(&self, entity: &EntityRef) -> Result<Option<Value>> {
        Ok(entity.id()?.filter(|id| !id.is_null()))
    }
}

pub struct EntityPersisterBuilder {
    entity_name: String,
    root_entity_name: Option<String>,
    identifier: IdentifierDescriptor,
    properties: Vec<PropertyDescriptor>,
    version: Option<String>,
}

impl EntityPersisterBuilder {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            root_entity_name: None,
            identifier: IdentifierDescriptor {
                name: "id".to_string(),
                data_type: DataType::Integer,
            },
            properties: Vec::new(),
            version: None,
        }
    }

    pub fn identifier(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.identifier = IdentifierDescriptor {
            name: name.into(),
            data_type,
        };
        self
    }

    /// Declares the hierarchy root for a subclass persister.
    pub fn root_entity(mut self, root_entity_name: impl Into<String>) -> Self {
        self.root_entity_name = Some(root_entity_name.into());
        self
    }

    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    /// Adds the optimistic-concurrency version property.
    pub fn version(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        let name = name.into();
        self.properties
            .push(PropertyDescriptor::scalar(name.clone(), data_type));
        self.version = Some(name);
        self
    }

    pub fn build(self) -> Result<EntityPersister> {
        if self.entity_name.is_empty() {
            return Err(DbError::MappingError("Entity name cannot be empty".into()));
        }

        let mut seen = HashSet::new();
        seen.insert(self.identifier.name.as_str());
        for property in &self.properties {
            if !seen.insert(property.name.as_str()) {
                return Err(DbError::MappingError(format!(
                    "Duplicate property '{}' on entity '{}'",
                    property.name, self.entity_name
                )));
            }
            if property
                .property_type
                .associated_entity()
                .is_some_and(str::is_empty)
            {
                return Err(DbError::MappingError(format!(
                    "Association '{}.{}' has no target entity",
                    self.entity_name, property.name
                )));
            }
        }

        let version_index = match &self.version {
            None => None,
            Some(name) => {
                let index = self
                    .properties
                    .iter()
                    .position(|p| &p.name == name)
                    .ok_or_else(|| {
                        DbError::MappingError(format!("Version property '{}' not found", name))
                    })?;
                match &self.properties[index].property_type {
                    PropertyType::Scalar(data_type) if data_type.is_versionable() => Some(index),
                    other => {
                        return Err(DbError::MappingError(format!(
                            "Version property '{}.{}' cannot have type {}",
                            self.entity_name, name, other
                        )));
                    }
                }
            }
        };

        let root_entity_name = self
            .root_entity_name
            .unwrap_or_else(|| self.entity_name.clone());

        Ok(EntityPersister {
            entity_name: self.entity_name,
            root_entity_name,
            identifier: self.identifier,
            properties: self.properties,
            version_index,
        })
    }
}

use crate::core::{DataType, DbError, PropertyValue, Result};

/// Declared type of a mapped property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyType {
    /// Immutable scalar column.
    Scalar(DataType),
    /// Mutable JSON document.
    Document,
    /// To-one association.
    Entity { entity_name: String },
    /// To-many association holding entities of `element`.
    Collection { element: String },
}

impl PropertyType {
    pub fn is_association(&self) -> bool {
        matches!(self, Self::Entity { .. } | Self::Collection { .. })
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection { .. })
    }

    /// Name of the associated entity, for association types.
    pub fn associated_entity(&self) -> Option<&str> {
        match self {
            Self::Entity { entity_name } => Some(entity_name),
            Self::Collection { element } => Some(element),
            _ => None,
        }
    }

    pub fn is_compatible(&self, value: &PropertyValue) -> bool {
        match (self, value) {
            (_, PropertyValue::Null) => true,
            (Self::Scalar(data_type), PropertyValue::Scalar(v)) => data_type.is_compatible(v),
            (Self::Document, PropertyValue::Document(_)) => true,
            (Self::Entity { .. }, PropertyValue::Entity(_)) => true,
            (Self::Collection { .. }, PropertyValue::Collection(_)) => true,
            _ => false,
        }
    }

    /// Copy of `value`, as this type copies it, that shares no mutable state
    /// with the original.
    ///
    /// Associated entities are never copied; the copy points at the same
    /// instances. Collections get a fresh handle over the same elements.
    pub fn deep_copy(&self, value: &PropertyValue) -> Result<PropertyValue> {
        Ok(match (self, value) {
            (_, PropertyValue::Null) => PropertyValue::Null,
            (Self::Scalar(data_type), PropertyValue::Scalar(v)) if data_type.is_compatible(v) => {
                PropertyValue::Scalar(v.clone())
            }
            (Self::Document, PropertyValue::Document(doc)) => {
                PropertyValue::Document(doc.deep_copy()?)
            }
            (Self::Entity { .. }, PropertyValue::Entity(entity)) => {
                PropertyValue::Entity(entity.clone())
            }
            (Self::Collection { .. }, PropertyValue::Collection(items)) => {
                PropertyValue::Collection(items.deep_copy()?)
            }
            (_, other) => {
                return Err(DbError::MappingError(format!(
                    "cannot copy a {} value as {}",
                    other.kind(),
                    self
                )));
            }
        })
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar(data_type) => write!(f, "{}", data_type),
            Self::Document => write!(f, "DOCUMENT"),
            Self::Entity { entity_name } => write!(f, "ENTITY<{}>", entity_name),
            Self::Collection { element } => write!(f, "COLLECTION<{}>", element),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub name: String,
    pub property_type: PropertyType,
    pub updateable: bool,
    pub nullable: bool,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            updateable: true,
            nullable: true,
        }
    }

    pub fn scalar(name: impl Into<String>, data_type: DataType) -> Self {
        Self::new(name, PropertyType::Scalar(data_type))
    }

    pub fn document(name: impl Into<String>) -> Self {
        Self::new(name, PropertyType::Document)
    }

    pub fn many_to_one(name: impl Into<String>, entity_name: impl Into<String>) -> Self {
        Self::new(
            name,
            PropertyType::Entity {
                entity_name: entity_name.into(),
            },
        )
    }

    pub fn one_to_many(name: impl Into<String>, element: impl Into<String>) -> Self {
        Self::new(
            name,
            PropertyType::Collection {
                element: element.into(),
            },
        )
    }

    pub fn not_updateable(mut self) -> Self {
        self.updateable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn validate(&self, value: &PropertyValue) -> Result<()> {
        if value.is_null() {
            if !self.nullable {
                return Err(DbError::ConstraintViolation(format!(
                    "Property '{}' cannot be NULL",
                    self.name
                )));
            }
            return Ok(());
        }

        if !self.property_type.is_compatible(value) {
            return Err(DbError::MappingError(format!(
                "Property '{}' expects type {}, got {}",
                self.name,
                self.property_type,
                value.kind()
            )));
        }

        Ok(())
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("a different object with the same identifier value was already associated with the session: [{entity_name}#{identifier}]")]
    NonUniqueObject {
        entity_name: String,
        identifier: String,
    },

    /// The owner is managed with a different collection instance in `role`;
    /// replacing a tracked collection requires evicting the owner first.
    #[error("collection {role} of {owner} is already managed through another collection instance")]
    NonUniqueCollection { role: String, owner: String },

    #[error("object references an unsaved transient instance: {entity_name}.{property}")]
    TransientObject {
        entity_name: String,
        property: String,
    },

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Mapping error: {0}")]
    MappingError(String),

    #[error("Unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Reassociation graph exceeds the limit of {limit} entities")]
    GraphTooLarge { limit: usize },

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl DbError {
    /// True for the identity conflict raised by the uniqueness check.
    pub fn is_non_unique_object(&self) -> bool {
        matches!(self, Self::NonUniqueObject { .. })
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigError(err.to_string())
    }
}

pub mod metamodel;
pub mod persister;
pub mod property;

pub use metamodel::Metamodel;
pub use persister::{EntityPersister, EntityPersisterBuilder, IdentifierDescriptor};
pub use property::{PropertyDescriptor, PropertyType};

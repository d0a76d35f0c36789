// ============================================================================
// memodb-session Library
// ============================================================================
//
// Session-side identity tracking for an object-relational persistence layer:
// binds transient or detached entities into a session's identity map,
// snapshots their state for change detection and propagates the binding
// across association graphs.
//
// ============================================================================

pub mod core;
pub mod engine;
pub mod entity;
pub mod event;
pub mod metadata;
pub mod session;

// Re-export main types for convenience
pub use crate::core::{DataType, DbError, Document, EntityCollection, PropertyValue, Result, Value};
pub use engine::{PersistenceContext, ReassociationSource, Snapshot};
pub use entity::{
    CollectionEntry, CollectionKey, EntityEntry, EntityInstance, EntityKey, EntityRef,
    EntityStatus, LockMode, RegistrationOptions,
};
pub use event::{LockVisitor, Reassociator};
pub use metadata::{EntityPersister, Metamodel, PropertyDescriptor, PropertyType};
pub use session::{Session, SessionConfig};

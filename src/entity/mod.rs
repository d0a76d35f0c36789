pub mod entry;
pub mod instance;
pub mod key;

pub use entry::{
    CollectionEntry, EntityEntry, EntityRegistration, EntityStatus, LockMode, RegistrationOptions,
};
pub use instance::{EntityInstance, EntityPtr, EntityRef};
pub use key::{CollectionKey, EntityKey, info_string};

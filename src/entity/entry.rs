// ============================================================================
// Managed Entity Records
// ============================================================================
//
// What a session remembers about every entity and collection it manages.
// Records are created by the persistence context only; callers receive
// clones.
//
// ============================================================================

use super::{CollectionKey, EntityKey, EntityRef};
use crate::core::{EntityCollection, Value};
use crate::engine::Snapshot;

/// Lifecycle state of a managed entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityStatus {
    Loaded,
    ReadOnly,
    Deleted,
    Gone,
    Saving,
}

impl EntityStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, EntityStatus::Loaded)
    }

    /// Deleted or gone entities no longer represent a live row.
    pub fn is_deleted(&self) -> bool {
        matches!(self, EntityStatus::Deleted | EntityStatus::Gone)
    }
}

impl std::fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityStatus::Loaded => write!(f, "LOADED"),
            EntityStatus::ReadOnly => write!(f, "READ_ONLY"),
            EntityStatus::Deleted => write!(f, "DELETED"),
            EntityStatus::Gone => write!(f, "GONE"),
            EntityStatus::Saving => write!(f, "SAVING"),
        }
    }
}

/// Concurrency-control intent held for a managed entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LockMode {
    #[default]
    None,
    Read,
    Upgrade,
    UpgradeNoWait,
    Write,
    Force,
}

impl std::fmt::Display for LockMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockMode::None => write!(f, "NONE"),
            LockMode::Read => write!(f, "READ"),
            LockMode::Upgrade => write!(f, "UPGRADE"),
            LockMode::UpgradeNoWait => write!(f, "UPGRADE_NOWAIT"),
            LockMode::Write => write!(f, "WRITE"),
            LockMode::Force => write!(f, "FORCE"),
        }
    }
}

/// Flags accompanying a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistrationOptions {
    /// The record stands for a row assumed present in storage.
    pub exists_in_storage: bool,
    /// Skip the checks the registry runs for genuinely new entities.
    pub skip_pre_insert_validation: bool,
    pub lazy_properties_unfetched: bool,
    pub disable_version_increment: bool,
}

impl RegistrationOptions {
    /// Options for an instance bound into the session from outside.
    pub fn reassociated() -> Self {
        Self {
            exists_in_storage: true,
            skip_pre_insert_validation: true,
            lazy_properties_unfetched: false,
            disable_version_increment: false,
        }
    }
}

/// Everything the registry needs to create an [`EntityEntry`].
#[derive(Debug, Clone)]
pub struct EntityRegistration {
    pub status: EntityStatus,
    pub loaded_state: Snapshot,
    pub key: EntityKey,
    pub version: Option<Value>,
    pub lock_mode: LockMode,
    pub options: RegistrationOptions,
}

#[derive(Debug, Clone)]
pub struct EntityEntry {
    entity: EntityRef,
    status: EntityStatus,
    loaded_state: Snapshot,
    key: EntityKey,
    version: Option<Value>,
    lock_mode: LockMode,
    exists_in_storage: bool,
    lazy_properties_unfetched: bool,
    disable_version_increment: bool,
}

impl EntityEntry {
    pub(crate) fn new(entity: EntityRef, registration: EntityRegistration) -> Self {
        Self {
            entity,
            status: registration.status,
            loaded_state: registration.loaded_state,
            key: registration.key,
            version: registration.version,
            lock_mode: registration.lock_mode,
            exists_in_storage: registration.options.exists_in_storage,
            lazy_properties_unfetched: registration.options.lazy_properties_unfetched,
            disable_version_increment: registration.options.disable_version_increment,
        }
    }

    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    pub fn status(&self) -> EntityStatus {
        self.status
    }

    pub fn loaded_state(&self) -> &Snapshot {
        &self.loaded_state
    }

    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    pub fn id(&self) -> &Value {
        self.key.identifier()
    }

    pub fn entity_name(&self) -> &str {
        self.key.entity_name()
    }

    pub fn version(&self) -> Option<&Value> {
        self.version.as_ref()
    }

    pub fn lock_mode(&self) -> LockMode {
        self.lock_mode
    }

    pub fn exists_in_storage(&self) -> bool {
        self.exists_in_storage
    }

    pub fn lazy_properties_unfetched(&self) -> bool {
        self.lazy_properties_unfetched
    }

    pub fn disable_version_increment(&self) -> bool {
        self.disable_version_increment
    }
}

/// A collection reattached to the session together with its owner.
#[derive(Debug, Clone)]
pub struct CollectionEntry {
    key: CollectionKey,
    collection: EntityCollection,
    snapshot: Vec<EntityRef>,
}

impl CollectionEntry {
    pub(crate) fn new(key: CollectionKey, collection: EntityCollection, snapshot: Vec<EntityRef>) -> Self {
        Self {
            key,
            collection,
            snapshot,
        }
    }

    pub fn key(&self) -> &CollectionKey {
        &self.key
    }

    pub fn role(&self) -> &str {
        &self.key.role
    }

    pub fn collection(&self) -> &EntityCollection {
        &self.collection
    }

    /// Element references as they were when the collection was reattached.
    pub fn snapshot(&self) -> &[EntityRef] {
        &self.snapshot
    }
}

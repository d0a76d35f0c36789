// ============================================================================
// Session Engine
// ============================================================================
//
// Identity registry, change journal and snapshot construction shared by the
// reassociation event code.
//
// ============================================================================

pub mod context;
pub mod journal;
pub mod snapshot;
pub mod source;

pub use context::PersistenceContext;
pub use journal::{RegistryChange, Savepoint};
pub use snapshot::Snapshot;
pub use source::ReassociationSource;

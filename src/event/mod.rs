// ============================================================================
// Reassociation Events
// ============================================================================
//
// Binding of transient or detached entities into a session:
// - `Reassociator`: registers one entity and drives graph propagation
// - `LockVisitor`: walks associations and binds every reachable entity
//
// ============================================================================

pub mod lock_visitor;
pub mod reassociate;

pub use lock_visitor::LockVisitor;
pub use reassociate::Reassociator;

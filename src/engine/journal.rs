// ============================================================================
// Registry Change Journal
// ============================================================================
//
// Reversible record of registry mutations, kept while at least one savepoint
// is open. Rolling back to a savepoint undoes every change made after it, in
// reverse order, which lets a failed graph reassociation leave the registry
// exactly as it found it.
//
// ============================================================================

use crate::entity::{CollectionEntry, CollectionKey, EntityEntry, EntityKey, EntityRef};

/// A single undoable registry mutation.
#[derive(Debug, Clone)]
pub enum RegistryChange {
    /// An entity record was inserted or replaced.
    EntityAdded {
        entity: EntityRef,
        key: EntityKey,
        /// Entry the entity had before, if it was already managed.
        previous: Option<EntityEntry>,
        /// Instance the key pointed at before, if any.
        displaced: Option<EntityRef>,
    },

    /// A collection record was inserted or replaced.
    CollectionAdded {
        key: CollectionKey,
        previous: Option<CollectionEntry>,
    },
}

/// Position in the journal returned by `savepoint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Savepoint(usize);

#[derive(Debug, Default)]
pub struct Journal {
    changes: Vec<RegistryChange>,
    open: usize,
}

impl Journal {
    pub fn is_recording(&self) -> bool {
        self.open > 0
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn savepoint(&mut self) -> Savepoint {
        self.open += 1;
        Savepoint(self.changes.len())
    }

    pub fn record(&mut self, change: RegistryChange) {
        if self.is_recording() {
            self.changes.push(change);
        }
    }

    /// Closes `savepoint` and hands back the changes made since, newest first.
    pub fn rollback_to(&mut self, savepoint: Savepoint) -> Vec<RegistryChange> {
        let mut undone = self.changes.split_off(savepoint.0.min(self.changes.len()));
        undone.reverse();
        self.close();
        undone
    }

    /// Closes `savepoint`, keeping its changes.
    pub fn release(&mut self, _savepoint: Savepoint) {
        self.close();
    }

    fn close(&mut self) {
        self.open = self.open.saturating_sub(1);
        if self.open == 0 {
            self.changes.clear();
        }
    }
}

//! Uncommitted state-transition scope

use crate::kv::{Changeset, CommittedStore, KvStore};
use parking_lot::RwLock;
use std::sync::Arc;

/// Uncommitted writes layered over a committed store.
///
/// Reads see pending writes first. Nothing reaches the committed store until
/// [`WorkingSet::commit`].
pub struct WorkingSet<C: ?Sized> {
    committed: Arc<C>,
    pending: RwLock<Changeset>,
}

impl<C: CommittedStore + ?Sized> WorkingSet<C> {
    /// Open an empty scope over `committed`
    pub fn new(committed: Arc<C>) -> Self {
        Self { committed, pending: RwLock::new(Changeset::new()) }
    }

    /// Write pending changes in one batch and reset the scope
    pub fn commit(&self) -> eyre::Result<usize> {
        let mut pending = self.pending.write();
        self.committed.write_batch(&pending)?;

        let written = pending.len();
        pending.clear();

        tracing::debug!(written, "Working set committed");
        Ok(written)
    }

    /// Drop pending changes
    pub fn discard(&self) {
        let mut pending = self.pending.write();
        if !pending.is_empty() {
            tracing::debug!(dropped = pending.len(), "Working set discarded");
        }
        pending.clear();
    }
}

impl<C: CommittedStore + ?Sized> KvStore for WorkingSet<C> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        if let Some(entry) = self.pending.read().get(key) {
            return entry.clone();
        }

        match self.committed.read(key) {
            Ok(value) => value,
            Err(err) => {
                // Unreadable committed state is fatal
                let key = hex::encode(key);
                tracing::error!(%key, error = %err, "Committed store read failed");
                panic!("committed store read failed: {err}");
            }
        }
    }

    fn set(&self, key: &[u8], value: &[u8]) {
        self.pending.write().insert(key.to_vec(), Some(value.to_vec()));
    }

    fn delete(&self, key: &[u8]) {
        self.pending.write().insert(key.to_vec(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;

    #[test]
    fn test_reads_observe_pending_writes() {
        let committed = Arc::new(MemoryStore::new());
        committed.set(b"a", b"old");

        let scope = WorkingSet::new(Arc::clone(&committed));
        scope.set(b"a", b"new");
        scope.set(b"b", b"fresh");

        assert_eq!(scope.get(b"a"), Some(b"new".to_vec()));
        assert_eq!(scope.get(b"b"), Some(b"fresh".to_vec()));
        // Committed store untouched until commit
        assert_eq!(committed.get(b"a"), Some(b"old".to_vec()));
        assert!(!committed.has(b"b"));
    }

    #[test]
    fn test_pending_delete_hides_committed_value() {
        let committed = Arc::new(MemoryStore::new());
        committed.set(b"a", b"v");

        let scope = WorkingSet::new(Arc::clone(&committed));
        scope.delete(b"a");

        assert!(!scope.has(b"a"));
        assert!(committed.has(b"a"));
    }

    #[test]
    fn test_commit() {
        let committed = Arc::new(MemoryStore::new());
        committed.set(b"gone", b"v");

        let scope = WorkingSet::new(Arc::clone(&committed));
        scope.set(b"k", b"v");
        scope.delete(b"gone");

        assert_eq!(scope.commit().unwrap(), 2);
        assert_eq!(scope.commit().unwrap(), 0);
        assert_eq!(committed.get(b"k"), Some(b"v".to_vec()));
        assert!(!committed.has(b"gone"));
    }

    #[test]
    fn test_over_trait_object() {
        let committed: Arc<dyn CommittedStore> = Arc::new(MemoryStore::new());
        let scope = WorkingSet::new(Arc::clone(&committed));
        scope.set(b"k", b"v");
        scope.commit().unwrap();

        assert_eq!(committed.read(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_discard() {
        let committed = Arc::new(MemoryStore::new());
        let scope = WorkingSet::new(Arc::clone(&committed));
        scope.set(b"k", b"v");

        scope.discard();

        assert_eq!(scope.get(b"k"), None);
        assert!(committed.is_empty());
    }
}

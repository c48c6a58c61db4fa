//! Raw key/value storage port

use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Pending changes: `None` marks a deletion
pub type Changeset = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

/// Key/value capability the bridge reads and writes through.
///
/// Implementations are scoped to the current state transition: reads observe
/// writes made earlier in the same scope.
pub trait KvStore: Send + Sync {
    /// Get value by key
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Set value by key
    fn set(&self, key: &[u8], value: &[u8]);

    /// Delete value by key
    fn delete(&self, key: &[u8]);

    /// Check whether a value is stored under key
    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }
}

/// Durable store a working set commits into
pub trait CommittedStore: Send + Sync {
    /// Read committed value
    fn read(&self, key: &[u8]) -> eyre::Result<Option<Vec<u8>>>;

    /// Apply all changes atomically
    fn write_batch(&self, changes: &Changeset) -> eyre::Result<()>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    /// Create new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// Copy of all stored values
    pub fn snapshot(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.values.read().clone()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &[u8], value: &[u8]) {
        self.values.write().insert(key.to_vec(), value.to_vec());
    }

    fn delete(&self, key: &[u8]) {
        self.values.write().remove(key);
    }

    fn has(&self, key: &[u8]) -> bool {
        self.values.read().contains_key(key)
    }
}

impl CommittedStore for MemoryStore {
    fn read(&self, key: &[u8]) -> eyre::Result<Option<Vec<u8>>> {
        Ok(self.get(key))
    }

    fn write_batch(&self, changes: &Changeset) -> eyre::Result<()> {
        let mut values = self.values.write();
        for (key, value) in changes {
            match value {
                Some(value) => {
                    values.insert(key.clone(), value.clone());
                }
                None => {
                    values.remove(key);
                }
            }
        }
        Ok(())
    }
}

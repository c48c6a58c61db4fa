//! Access-path addressed view over a key/value store

use crate::{key::KeyScheme, kv::KvStore};
use dvm_primitives::AccessPath;
use std::sync::Arc;

/// VM resource store keyed by access path
#[derive(Clone)]
pub struct VmStore {
    kv: Arc<dyn KvStore>,
    scheme: KeyScheme,
}

impl VmStore {
    /// Create new store over `kv` using `scheme` for key derivation
    pub fn new(kv: Arc<dyn KvStore>, scheme: KeyScheme) -> Self {
        Self { kv, scheme }
    }

    /// Get raw value stored under access path
    pub fn get_value(&self, access_path: &AccessPath) -> Option<Vec<u8>> {
        let value = self.kv.get(&self.scheme.encode(access_path));
        tracing::trace!(%access_path, found = value.is_some(), "VM value read");
        value
    }

    /// Store raw value under access path
    pub fn set_value(&self, access_path: &AccessPath, value: &[u8]) {
        tracing::debug!(%access_path, len = value.len(), "VM value written");
        self.kv.set(&self.scheme.encode(access_path), value);
    }

    /// Delete value stored under access path
    pub fn del_value(&self, access_path: &AccessPath) {
        tracing::debug!(%access_path, "VM value deleted");
        self.kv.delete(&self.scheme.encode(access_path));
    }

    /// Check whether a value is stored under access path
    pub fn has_value(&self, access_path: &AccessPath) -> bool {
        self.kv.has(&self.scheme.encode(access_path))
    }
}

impl std::fmt::Debug for VmStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VmStore").field("scheme", &self.scheme).finish_non_exhaustive()
    }
}

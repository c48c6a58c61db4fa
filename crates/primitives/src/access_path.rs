use crate::address::VmAddress;
use alloy_primitives::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One storage cell visible to the VM
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccessPath {
    /// Owning account
    pub address: VmAddress,
    /// Resource path under the account
    pub path: Bytes,
}

impl AccessPath {
    /// Create new access path
    pub fn new(address: VmAddress, path: impl Into<Bytes>) -> Self {
        Self { address, path: path.into() }
    }

    /// Access path under the reserved zero address
    pub fn global(path: impl Into<Bytes>) -> Self {
        Self::new(VmAddress::ZERO, path)
    }
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, hex::encode(&self.path))
    }
}

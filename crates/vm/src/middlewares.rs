//! Data-source middlewares
//!
//! Middlewares answer reads of synthetic resources the ledger never stores, such
//! as the current block height. They run in registration order before storage.

use crate::context::DsContext;
use dvm_primitives::AccessPath;
use sha3::{Digest, Sha3_256};
use std::sync::Arc;

/// First path byte of resource paths
pub const RESOURCE_PATH_PREFIX: u8 = 0x01;

/// Resource tag of the block metadata value
pub const BLOCK_METADATA_TAG: &str = "Block::BlockMetadata";

/// Resource tag of the current timestamp value
pub const CURRENT_TIMESTAMP_TAG: &str = "Time::CurrentTimestamp";

/// Read hook consulted before storage
pub trait DataMiddleware: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Value for `path`, or `None` to let the next middleware answer
    fn try_read(&self, ctx: &DsContext, path: &AccessPath) -> Option<Vec<u8>>;
}

/// Path of a resource tag: `0x01 || sha3_256(tag)`
pub fn resource_path(tag: &str) -> Vec<u8> {
    let hash = Sha3_256::digest(tag.as_bytes());

    let mut path = Vec::with_capacity(1 + hash.len());
    path.push(RESOURCE_PATH_PREFIX);
    path.extend_from_slice(&hash);
    path
}

/// Where the VM reads the block height
pub fn block_metadata_path() -> AccessPath {
    AccessPath::global(resource_path(BLOCK_METADATA_TAG))
}

/// Where the VM reads the block time
pub fn current_timestamp_path() -> AccessPath {
    AccessPath::global(resource_path(CURRENT_TIMESTAMP_TAG))
}

/// Serves the current block height as u64 LE
#[derive(Debug)]
pub struct BlockMiddleware {
    path: AccessPath,
}

impl BlockMiddleware {
    pub fn new() -> Self {
        Self { path: block_metadata_path() }
    }
}

impl Default for BlockMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl DataMiddleware for BlockMiddleware {
    fn name(&self) -> &'static str {
        "block"
    }

    fn try_read(&self, ctx: &DsContext, path: &AccessPath) -> Option<Vec<u8>> {
        (*path == self.path).then(|| ctx.header.height.to_le_bytes().to_vec())
    }
}

/// Serves the current block time in unix seconds as u64 LE
#[derive(Debug)]
pub struct TimeMiddleware {
    path: AccessPath,
}

impl TimeMiddleware {
    pub fn new() -> Self {
        Self { path: current_timestamp_path() }
    }
}

impl Default for TimeMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl DataMiddleware for TimeMiddleware {
    fn name(&self) -> &'static str {
        "time"
    }

    fn try_read(&self, ctx: &DsContext, path: &AccessPath) -> Option<Vec<u8>> {
        (*path == self.path).then(|| ctx.header.time.to_le_bytes().to_vec())
    }
}

/// Block then time middleware
pub fn default_middlewares() -> Vec<Arc<dyn DataMiddleware>> {
    vec![Arc::new(BlockMiddleware::new()), Arc::new(TimeMiddleware::new())]
}

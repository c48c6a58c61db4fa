//! Bridge configuration

use dvm_storage::KeyScheme;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, time::Duration};

/// Default VM JSON-RPC endpoint
pub const DEFAULT_VM_ADDRESS: &str = "http://127.0.0.1:50051";

/// Default listen address of the data-source endpoint
pub const DEFAULT_DATA_LISTEN: &str = "127.0.0.1:50052";

/// Default compiler JSON-RPC endpoint
pub const DEFAULT_COMPILER_ADDRESS: &str = "http://127.0.0.1:50053";

/// VM bridge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// VM JSON-RPC URL
    pub vm_address: String,
    /// Where the data-source endpoint listens for VM reads
    pub data_listen: SocketAddr,
    /// Compiler JSON-RPC URL
    pub compiler_address: String,
    /// Storage key layout
    pub key_scheme: KeyScheme,
    /// Transport timeout of one VM request
    pub request_timeout_secs: u64,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            vm_address: DEFAULT_VM_ADDRESS.to_string(),
            data_listen: SocketAddr::from(([127, 0, 0, 1], 50052)),
            compiler_address: DEFAULT_COMPILER_ADDRESS.to_string(),
            key_scheme: KeyScheme::Canonical,
            request_timeout_secs: 60,
        }
    }
}

impl VmConfig {
    /// Load config from a JSON file, missing fields take defaults
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw)?;
        tracing::debug!(path = %path.display(), ?config, "VM config loaded");
        Ok(config)
    }

    /// Request timeout as duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

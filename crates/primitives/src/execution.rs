use crate::{access_path::AccessPath, contract::VmTypeTag};
use alloy_primitives::Bytes;
use serde::{Deserialize, Serialize};

/// Major status code the VM reports for a contract executed without fault
pub const VM_CODE_EXECUTED: u64 = 4001;

/// Coarse execution outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    /// Write-set and events are to be applied
    Keep,
    /// Execution is dropped without side effects
    Discard,
}

/// Detailed VM status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmStatus {
    pub major_status: u64,
    pub sub_status: u64,
    pub message: String,
}

impl VmStatus {
    /// Whether the major code is the "executed" sentinel
    pub fn is_executed(&self) -> bool {
        self.major_status == VM_CODE_EXECUTED
    }
}

/// Write-set operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WriteOp {
    /// Create or overwrite the value at `path`
    Value { path: AccessPath, value: Bytes },
    /// Remove the value at `path`
    Deletion { path: AccessPath },
}

impl WriteOp {
    /// Target access path
    pub fn path(&self) -> &AccessPath {
        match self {
            Self::Value { path, .. } | Self::Deletion { path } => path,
        }
    }
}

/// Event emitted by the VM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedEvent {
    pub key: Bytes,
    pub sequence_number: u64,
    #[serde(rename = "type")]
    pub type_tag: VmTypeTag,
    pub event_data: Bytes,
    /// Module that emitted the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

/// Result of one contract execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: ContractStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_struct: Option<VmStatus>,
    #[serde(default)]
    pub write_set: Vec<WriteOp>,
    #[serde(default)]
    pub events: Vec<TypedEvent>,
}

impl ExecutionResult {
    /// Result without status details, write-set or events
    pub fn new(status: ContractStatus) -> Self {
        Self { status, status_struct: None, write_set: vec![], events: vec![] }
    }

    /// Attach detailed status
    pub fn with_status(mut self, status: VmStatus) -> Self {
        self.status_struct = Some(status);
        self
    }

    /// Attach write-set
    pub fn with_write_set(mut self, write_set: Vec<WriteOp>) -> Self {
        self.write_set = write_set;
        self
    }

    /// Attach events
    pub fn with_events(mut self, events: Vec<TypedEvent>) -> Self {
        self.events = events;
        self
    }
}

/// VM response to an execute request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResponse {
    pub executions: Vec<ExecutionResult>,
}

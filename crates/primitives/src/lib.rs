//! VM bridge primitives
//!
//! Core types shared between the ledger and the external VM:
//! - Addresses and access paths
//! - Contract requests and execution responses
//! - VM module messages

pub mod access_path;
pub mod address;
pub mod contract;
pub mod execution;
pub mod transaction;

pub use access_path::AccessPath;
pub use address::{AddressError, VmAddress, VM_ADDRESS_LENGTH};
pub use contract::{
    ArgumentError, CompilationResult, ContractKind, ContractRequest, ExecuteRequest, ScriptArg,
    SourceFile, VmTypeTag, VM_GAS_PRICE,
};
pub use execution::{
    ContractStatus, ExecutionResponse, ExecutionResult, TypedEvent, VmStatus, WriteOp,
    VM_CODE_EXECUTED,
};
pub use transaction::{MsgDeployModule, MsgError, MsgExecuteScript, VmMsg};

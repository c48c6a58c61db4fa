//! Bridge errors and fatal faults

use dvm_primitives::{AccessPath, ArgumentError, MsgError, VmTypeTag};

/// Errors returned to the caller of a VM instruction
#[derive(Debug, thiserror::Error)]
pub enum VmError {
    /// Message rejected by basic validation
    #[error("invalid message: {0}")]
    InvalidMessage(#[source] MsgError),
    /// Script argument doesn't match its type tag
    #[error("invalid argument {index}: {source}")]
    InvalidArgument {
        index: usize,
        #[source]
        source: ArgumentError,
    },
    /// Compiler reported errors, joined one per line
    #[error("compilation failed:\n{0}")]
    Compilation(String),
}

impl From<MsgError> for VmError {
    fn from(err: MsgError) -> Self {
        match err {
            MsgError::Argument { index, source } => Self::InvalidArgument { index, source },
            other => Self::InvalidMessage(other),
        }
    }
}

/// Data-source read errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DsError {
    #[error("no value stored at {0}")]
    NotFound(AccessPath),
    #[error("no VM execution in flight")]
    NoActiveExecution,
}

/// Unrecoverable bridge faults, raised through [`fault`] and never returned
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VmFault {
    #[error("VM transport failure: {0}")]
    Transport(String),
    #[error("VM returned {0} execution results, expected exactly one")]
    ExecutionCount(usize),
    #[error("malformed {tag} event data: {reason}")]
    MalformedEvent { tag: VmTypeTag, reason: DecodeError },
    #[error("data source is already serving an execution")]
    ScopeBusy,
}

/// Event payload decoding errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("expected {expected} bytes, got {actual}")]
    Width { expected: usize, actual: usize },
    #[error("invalid bool byte {0:#04x}")]
    InvalidBool(u8),
}

/// Abort block processing
pub fn fault(fault: VmFault) -> ! {
    tracing::error!(%fault, "Fatal VM bridge fault");
    panic!("{fault}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_errors_map_to_invalid_argument() {
        let err: VmError = MsgError::Argument {
            index: 2,
            source: ArgumentError::UnsupportedType(VmTypeTag::Struct),
        }
        .into();
        assert!(matches!(err, VmError::InvalidArgument { index: 2, .. }));

        let err: VmError = MsgError::EmptyCode.into();
        assert!(matches!(err, VmError::InvalidMessage(MsgError::EmptyCode)));
    }

    #[test]
    #[should_panic(expected = "expected exactly one")]
    fn test_fault_panics_with_message() {
        fault(VmFault::ExecutionCount(0));
    }
}

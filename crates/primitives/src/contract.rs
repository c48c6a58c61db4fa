use crate::address::VmAddress;
use alloy_primitives::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gas unit price attached to every contract request
pub const VM_GAS_PRICE: u64 = 1;

/// Kind of contract submitted to the VM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    /// Module publication
    Module,
    /// Script execution
    Script,
}

/// VM value type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum VmTypeTag {
    Bool = 0,
    U64 = 1,
    ByteArray = 2,
    Address = 3,
    Struct = 4,
    U8 = 5,
    U128 = 6,
    Vector = 7,
}

impl VmTypeTag {
    /// Tag name as it appears in events
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U64 => "u64",
            Self::ByteArray => "byte_array",
            Self::Address => "address",
            Self::Struct => "struct",
            Self::U8 => "u8",
            Self::U128 => "u128",
            Self::Vector => "vector",
        }
    }

    /// Whether scripts may take an argument of this type
    pub const fn is_script_argument(&self) -> bool {
        !matches!(self, Self::Struct | Self::Vector)
    }
}

impl TryFrom<u8> for VmTypeTag {
    type Error = ArgumentError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::Bool,
            1 => Self::U64,
            2 => Self::ByteArray,
            3 => Self::Address,
            4 => Self::Struct,
            5 => Self::U8,
            6 => Self::U128,
            7 => Self::Vector,
            _ => return Err(ArgumentError::UnknownTag(code)),
        })
    }
}

impl fmt::Display for VmTypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Script argument errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    #[error("unknown type tag code {0}")]
    UnknownTag(u8),
    #[error("type {0} can't be used as a script argument")]
    UnsupportedType(VmTypeTag),
    #[error("value {value:?} is not a valid {tag}")]
    InvalidValue { tag: VmTypeTag, value: String },
}

/// Typed script argument
///
/// Values travel as text, the VM parses them according to the tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptArg {
    #[serde(rename = "type")]
    pub type_tag: VmTypeTag,
    pub value: String,
}

impl ScriptArg {
    /// Create new argument
    pub fn new(type_tag: VmTypeTag, value: impl Into<String>) -> Self {
        Self { type_tag, value: value.into() }
    }

    /// Check that the tag is a legal argument type and the value parses as that type
    pub fn validate(&self) -> Result<(), ArgumentError> {
        let invalid =
            || ArgumentError::InvalidValue { tag: self.type_tag, value: self.value.clone() };
        let value = self.value.as_str();

        if !self.type_tag.is_script_argument() {
            return Err(ArgumentError::UnsupportedType(self.type_tag));
        }

        match self.type_tag {
            VmTypeTag::Bool => {
                value.parse::<bool>().map_err(|_| invalid())?;
            }
            VmTypeTag::U8 => {
                value.parse::<u8>().map_err(|_| invalid())?;
            }
            VmTypeTag::U64 => {
                value.parse::<u64>().map_err(|_| invalid())?;
            }
            VmTypeTag::U128 => {
                value.parse::<u128>().map_err(|_| invalid())?;
            }
            VmTypeTag::Address => {
                VmAddress::from_hex_lenient(value).map_err(|_| invalid())?;
            }
            VmTypeTag::ByteArray => {
                // Move literal form x"..", or plain hex
                let raw = value
                    .strip_prefix("x\"")
                    .and_then(|v| v.strip_suffix('"'))
                    .or_else(|| value.strip_prefix("0x"))
                    .unwrap_or(value);
                hex::decode(raw).map_err(|_| invalid())?;
            }
            VmTypeTag::Struct | VmTypeTag::Vector => {}
        }

        Ok(())
    }
}

/// Single contract submitted for execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRequest {
    pub address: VmAddress,
    pub max_gas_amount: u64,
    pub gas_unit_price: u64,
    pub code: Bytes,
    pub contract_type: ContractKind,
    pub args: Vec<ScriptArg>,
}

/// Execution request envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub contracts: Vec<ContractRequest>,
    pub options: u64,
}

impl ExecuteRequest {
    /// Request carrying exactly one contract
    pub fn single(contract: ContractRequest) -> Self {
        Self { contracts: vec![contract], options: 0 }
    }
}

/// Source file submitted to the compiler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub text: String,
    pub address: VmAddress,
    #[serde(rename = "type")]
    pub kind: ContractKind,
}

/// Compiler output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationResult {
    pub bytecode: Bytes,
    pub errors: Vec<String>,
}

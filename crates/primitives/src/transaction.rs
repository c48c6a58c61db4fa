use crate::contract::{ArgumentError, ScriptArg};
use alloy_primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};

/// Message validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MsgError {
    #[error("empty signer address")]
    EmptySigner,
    #[error("empty contract code")]
    EmptyCode,
    #[error("argument {index}: {source}")]
    Argument {
        index: usize,
        #[source]
        source: ArgumentError,
    },
}

/// Publish a module under the signer's account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDeployModule {
    pub signer: Address,
    pub module: Bytes,
}

impl MsgDeployModule {
    pub fn new(signer: Address, module: impl Into<Bytes>) -> Self {
        Self { signer, module: module.into() }
    }

    /// Stateless checks
    pub fn validate_basic(&self) -> Result<(), MsgError> {
        if self.signer.is_zero() {
            return Err(MsgError::EmptySigner);
        }
        if self.module.is_empty() {
            return Err(MsgError::EmptyCode);
        }
        Ok(())
    }
}

/// Run a script on behalf of the signer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgExecuteScript {
    pub signer: Address,
    pub script: Bytes,
    #[serde(default)]
    pub args: Vec<ScriptArg>,
}

impl MsgExecuteScript {
    pub fn new(signer: Address, script: impl Into<Bytes>, args: Vec<ScriptArg>) -> Self {
        Self { signer, script: script.into(), args }
    }

    /// Stateless checks, including argument type tags and values
    pub fn validate_basic(&self) -> Result<(), MsgError> {
        if self.signer.is_zero() {
            return Err(MsgError::EmptySigner);
        }
        if self.script.is_empty() {
            return Err(MsgError::EmptyCode);
        }
        for (index, arg) in self.args.iter().enumerate() {
            arg.validate().map_err(|source| MsgError::Argument { index, source })?;
        }
        Ok(())
    }
}

/// VM module message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VmMsg {
    DeployModule(MsgDeployModule),
    ExecuteScript(MsgExecuteScript),
}

impl VmMsg {
    /// Message signer
    pub fn signer(&self) -> Address {
        match self {
            Self::DeployModule(msg) => msg.signer,
            Self::ExecuteScript(msg) => msg.signer,
        }
    }

    /// Stateless checks
    pub fn validate_basic(&self) -> Result<(), MsgError> {
        match self {
            Self::DeployModule(msg) => msg.validate_basic(),
            Self::ExecuteScript(msg) => msg.validate_basic(),
        }
    }
}

//! Compiler helpers for off-chain tooling

use crate::{client::VmClient, error::VmError};
use alloy_primitives::Bytes;
use dvm_primitives::{SourceFile, VmTypeTag};

/// Compile `source` to bytecode, failing with every compiler error
pub async fn compile(client: &dyn VmClient, source: SourceFile) -> eyre::Result<Bytes> {
    let kind = source.kind;
    let result = client.compile(source).await?;

    if !result.errors.is_empty() {
        tracing::warn!(?kind, errors = result.errors.len(), "Compilation failed");
        return Err(VmError::Compilation(result.errors.join("\n")).into());
    }

    tracing::info!(?kind, size = result.bytecode.len(), "Compiled");
    Ok(result.bytecode)
}

/// Argument types a compiled script expects
pub async fn extract_arguments(client: &dyn VmClient, code: Bytes) -> eyre::Result<Vec<VmTypeTag>> {
    client.get_signature(code).await
}

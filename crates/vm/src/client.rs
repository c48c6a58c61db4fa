//! VM client

use crate::config::VmConfig;
use alloy_primitives::Bytes;
use async_trait::async_trait;
use dvm_primitives::{
    CompilationResult, ExecuteRequest, ExecutionResponse, SourceFile, VmTypeTag,
};
use jsonrpsee::{
    core::RpcResult,
    http_client::{HttpClient, HttpClientBuilder},
    proc_macros::rpc,
};
use std::time::Duration;

/// JSON-RPC interface of the external VM
#[rpc(server, client, namespace = "vm")]
pub trait VmApi {
    /// Execute contracts
    #[method(name = "executeContracts")]
    async fn execute_contracts(&self, request: ExecuteRequest) -> RpcResult<ExecutionResponse>;

    /// Compile a source file
    #[method(name = "compile")]
    async fn compile(&self, source: SourceFile) -> RpcResult<CompilationResult>;

    /// Argument types of a compiled script
    #[method(name = "getSignature")]
    async fn get_signature(&self, code: Bytes) -> RpcResult<Vec<VmTypeTag>>;
}

/// Round trips to the external VM
#[async_trait]
pub trait VmClient: Send + Sync {
    /// Execute contracts
    async fn execute(&self, request: ExecuteRequest) -> eyre::Result<ExecutionResponse>;

    /// Compile a source file
    async fn compile(&self, source: SourceFile) -> eyre::Result<CompilationResult>;

    /// Argument types of a compiled script
    async fn get_signature(&self, code: Bytes) -> eyre::Result<Vec<VmTypeTag>>;
}

/// HTTP JSON-RPC client of the VM
#[derive(Debug, Clone)]
pub struct RpcVmClient {
    client: HttpClient,
    url: String,
}

impl RpcVmClient {
    /// Connect to `url`
    pub fn new(url: &str, request_timeout: Duration) -> eyre::Result<Self> {
        let client = HttpClientBuilder::default().request_timeout(request_timeout).build(url)?;
        tracing::info!(url, timeout_secs = request_timeout.as_secs(), "VM client created");
        Ok(Self { client, url: url.to_string() })
    }

    /// Client of the configured VM
    pub fn from_config(config: &VmConfig) -> eyre::Result<Self> {
        Self::new(&config.vm_address, config.request_timeout())
    }

    /// Client of the configured compiler
    pub fn compiler(config: &VmConfig) -> eyre::Result<Self> {
        Self::new(&config.compiler_address, config.request_timeout())
    }
}

#[async_trait]
impl VmClient for RpcVmClient {
    async fn execute(&self, request: ExecuteRequest) -> eyre::Result<ExecutionResponse> {
        let contracts = request.contracts.len();
        tracing::debug!(url = %self.url, contracts, "Sending execute request");
        Ok(VmApiClient::execute_contracts(&self.client, request).await?)
    }

    async fn compile(&self, source: SourceFile) -> eyre::Result<CompilationResult> {
        Ok(VmApiClient::compile(&self.client, source).await?)
    }

    async fn get_signature(&self, code: Bytes) -> eyre::Result<Vec<VmTypeTag>> {
        Ok(VmApiClient::get_signature(&self.client, code).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        assert!(RpcVmClient::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_from_config() {
        assert!(RpcVmClient::from_config(&VmConfig::default()).is_ok());
        assert!(RpcVmClient::compiler(&VmConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_vm_is_an_error() {
        // Nothing listens on the discard port
        let client = RpcVmClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        assert!(client.get_signature(Bytes::from(vec![1u8])).await.is_err());
    }
}

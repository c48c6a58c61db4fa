//! Data-source JSON-RPC service the VM reads ledger state through

use alloy_primitives::Bytes;
use dvm_primitives::AccessPath;
use dvm_vm::{DsError, DsServer};
use jsonrpsee::{
    core::RpcResult,
    proc_macros::rpc,
    server::{ServerBuilder, ServerHandle},
    types::ErrorObjectOwned,
};
use std::net::SocketAddr;

/// No value stored at the requested path
pub const DS_NOT_FOUND_CODE: i32 = -32001;

/// Read arrived while no execution is in flight
pub const DS_INACTIVE_CODE: i32 = -32002;

/// Data-source JSON-RPC interface
#[rpc(server, client, namespace = "ds")]
pub trait DsApi {
    /// Raw value at an access path
    #[method(name = "getRaw")]
    async fn get_raw(&self, path: AccessPath) -> RpcResult<Bytes>;

    /// Raw values at several access paths, all or nothing
    #[method(name = "multiGetRaw")]
    async fn multi_get_raw(&self, paths: Vec<AccessPath>) -> RpcResult<Vec<Bytes>>;

    /// Whether an oracle price is stored for an asset
    #[method(name = "hasOraclePrice")]
    async fn has_oracle_price(&self, asset_code: String) -> RpcResult<bool>;
}

fn ds_error(err: DsError) -> ErrorObjectOwned {
    let code = match err {
        DsError::NotFound(_) => DS_NOT_FOUND_CODE,
        DsError::NoActiveExecution => DS_INACTIVE_CODE,
    };
    ErrorObjectOwned::owned(code, err.to_string(), None::<()>)
}

/// Data-source RPC server implementation
#[derive(Clone)]
pub struct DsRpc {
    ds: DsServer,
}

impl DsRpc {
    pub fn new(ds: DsServer) -> Self {
        Self { ds }
    }
}

#[async_trait::async_trait]
impl DsApiServer for DsRpc {
    async fn get_raw(&self, path: AccessPath) -> RpcResult<Bytes> {
        self.ds.read(&path).map(Bytes::from).map_err(ds_error)
    }

    async fn multi_get_raw(&self, paths: Vec<AccessPath>) -> RpcResult<Vec<Bytes>> {
        let values = self.ds.multi_read(&paths).map_err(ds_error)?;
        Ok(values.into_iter().map(Bytes::from).collect())
    }

    async fn has_oracle_price(&self, asset_code: String) -> RpcResult<bool> {
        self.ds.has_oracle_price(&asset_code).map_err(ds_error)
    }
}

/// Start data-source RPC server, returns the bound address
pub async fn start_ds_rpc_server(
    ds: DsServer,
    addr: SocketAddr,
) -> eyre::Result<(ServerHandle, SocketAddr)> {
    let server = ServerBuilder::default().build(addr).await?;
    let local_addr = server.local_addr()?;

    let handle = server.start(DsRpc::new(ds).into_rpc());

    tracing::info!(%local_addr, "Data-source JSON-RPC server listening");

    Ok((handle, local_addr))
}

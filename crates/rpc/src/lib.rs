//! VM bridge RPC module
//!
//! This crate provides RPC interfaces:
//! - Data-source JSON-RPC (port 50052): storage reads served to the VM
//! - VM REST API (port 9845): message execution and committed value queries

pub mod api;
pub mod ds_rpc;

pub use api::{
    ExecuteMsgRequest, ExecuteMsgResponse, HealthResponse, VmApi, VmValueResponse,
    DEFAULT_GAS_LIMIT,
};
pub use ds_rpc::{
    start_ds_rpc_server, DsApiClient, DsApiServer, DsRpc, DS_INACTIVE_CODE, DS_NOT_FOUND_CODE,
};

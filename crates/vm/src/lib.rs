//! VM execution bridge
//!
//! Connects the ledger to an external Move-style VM:
//! - builds execution requests from module messages
//! - serves the VM's storage reads through the data-source server
//! - translates execution status and VM events into ledger events
//! - applies write-sets of kept executions

pub mod client;
pub mod compiler;
pub mod config;
pub mod context;
pub mod ds_server;
pub mod error;
pub mod events;
pub mod keeper;
pub mod middlewares;
pub mod oracle;
pub mod request;
pub mod write_set;

pub use client::{RpcVmClient, VmApiClient, VmApiServer, VmClient};
pub use config::VmConfig;
pub use context::{Attribute, BlockHeader, DsContext, Event, EventManager, ExecContext, GasMeter};
pub use ds_server::{DsScope, DsServer};
pub use error::{fault, DecodeError, DsError, VmError, VmFault};
pub use events::{translate_event, translate_result, TypeDecoders};
pub use keeper::VmKeeper;
pub use middlewares::{
    block_metadata_path, current_timestamp_path, BlockMiddleware, DataMiddleware, TimeMiddleware,
};
pub use oracle::oracle_access_path;
pub use request::{build_deploy_request, build_execute_request};
pub use write_set::apply_write_set;

//! VM keeper: dispatches instructions to the VM and applies their results

use crate::{
    client::VmClient,
    context::ExecContext,
    ds_server::DsServer,
    error::{fault, VmError, VmFault},
    events::{translate_result, TypeDecoders},
    oracle,
    request::{build_deploy_request, build_execute_request},
    write_set::apply_write_set,
};
use dvm_primitives::{
    AccessPath, ContractStatus, ExecuteRequest, ExecutionResponse, ExecutionResult,
    MsgDeployModule, MsgExecuteScript, VmMsg,
};
use std::sync::Arc;

/// VM keeper
pub struct VmKeeper {
    client: Arc<dyn VmClient>,
    ds_server: DsServer,
    decoders: TypeDecoders,
}

impl VmKeeper {
    /// Create new keeper
    pub fn new(client: Arc<dyn VmClient>, ds_server: DsServer, decoders: TypeDecoders) -> Self {
        Self { client, ds_server, decoders }
    }

    /// Data-source server the VM reads through
    pub fn ds_server(&self) -> &DsServer {
        &self.ds_server
    }

    /// Publish a module
    pub async fn deploy_contract(
        &self,
        ctx: &mut ExecContext,
        msg: &MsgDeployModule,
    ) -> Result<(), VmError> {
        let request = build_deploy_request(ctx, msg)?;
        tracing::info!(signer = %msg.signer, size = msg.module.len(), "Deploying module");

        self.dispatch(ctx, request).await;
        Ok(())
    }

    /// Run a script
    pub async fn execute_script(
        &self,
        ctx: &mut ExecContext,
        msg: &MsgExecuteScript,
    ) -> Result<(), VmError> {
        let request = build_execute_request(ctx, msg)?;
        tracing::info!(signer = %msg.signer, args = msg.args.len(), "Executing script");

        self.dispatch(ctx, request).await;
        Ok(())
    }

    /// Route a module message
    pub async fn handle_msg(&self, ctx: &mut ExecContext, msg: &VmMsg) -> Result<(), VmError> {
        match msg {
            VmMsg::DeployModule(msg) => self.deploy_contract(ctx, msg).await,
            VmMsg::ExecuteScript(msg) => self.execute_script(ctx, msg).await,
        }
    }

    async fn dispatch(&self, ctx: &mut ExecContext, request: ExecuteRequest) {
        let response = {
            let _scope = self.ds_server.enter(ctx.ds_context());
            match self.client.execute(request).await {
                Ok(response) => response,
                Err(err) => fault(VmFault::Transport(format!("{err:#}"))),
            }
        };

        let execution = single_execution(response);
        self.process_execution(ctx, execution);
    }

    /// Emit events of `execution` and apply its write-set when kept
    pub fn process_execution(&self, ctx: &mut ExecContext, execution: ExecutionResult) {
        // Malformed events fault before the write-set lands
        let events = translate_result(&self.decoders, &execution);

        if execution.status == ContractStatus::Keep {
            apply_write_set(&ctx.store, &execution.write_set);
        }

        tracing::info!(
            status = ?execution.status,
            major_status = execution.status_struct.as_ref().map(|s| s.major_status),
            writes = execution.write_set.len(),
            events = events.len(),
            "VM execution processed"
        );

        ctx.events.emit_all(events);
    }

    /// Raw value at `access_path`
    pub fn get_value(&self, ctx: &ExecContext, access_path: &AccessPath) -> Option<Vec<u8>> {
        ctx.store.get_value(access_path)
    }

    /// Store raw value at `access_path`
    pub fn set_value(&self, ctx: &ExecContext, access_path: &AccessPath, value: &[u8]) {
        ctx.store.set_value(access_path, value)
    }

    /// Delete value at `access_path`
    pub fn del_value(&self, ctx: &ExecContext, access_path: &AccessPath) {
        ctx.store.del_value(access_path)
    }

    /// Whether a value is stored at `access_path`
    pub fn has_value(&self, ctx: &ExecContext, access_path: &AccessPath) -> bool {
        ctx.store.has_value(access_path)
    }

    /// Access path of the oracle price for `asset_code`
    pub fn oracle_access_path(&self, asset_code: &str) -> AccessPath {
        oracle::oracle_access_path(asset_code)
    }
}

fn single_execution(response: ExecutionResponse) -> ExecutionResult {
    let mut executions = response.executions;
    if executions.len() != 1 {
        fault(VmFault::ExecutionCount(executions.len()));
    }
    executions.remove(0)
}

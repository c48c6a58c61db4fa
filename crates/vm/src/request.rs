//! Execution request builder

use crate::{context::ExecContext, error::VmError};
use dvm_primitives::{
    ContractKind, ContractRequest, ExecuteRequest, MsgDeployModule, MsgExecuteScript, VmAddress,
    VM_GAS_PRICE,
};

/// Build the request publishing `msg.module`
pub fn build_deploy_request(
    ctx: &ExecContext,
    msg: &MsgDeployModule,
) -> Result<ExecuteRequest, VmError> {
    msg.validate_basic()?;

    let contract = ContractRequest {
        address: VmAddress::from_account(msg.signer),
        max_gas_amount: ctx.free_gas(),
        gas_unit_price: VM_GAS_PRICE,
        code: msg.module.clone(),
        contract_type: ContractKind::Module,
        args: Vec::new(),
    };

    Ok(ExecuteRequest::single(contract))
}

/// Build the request running `msg.script` with its arguments
pub fn build_execute_request(
    ctx: &ExecContext,
    msg: &MsgExecuteScript,
) -> Result<ExecuteRequest, VmError> {
    msg.validate_basic()?;

    let contract = ContractRequest {
        address: VmAddress::from_account(msg.signer),
        max_gas_amount: ctx.free_gas(),
        gas_unit_price: VM_GAS_PRICE,
        code: msg.script.clone(),
        contract_type: ContractKind::Script,
        args: msg.args.clone(),
    };

    Ok(ExecuteRequest::single(contract))
}

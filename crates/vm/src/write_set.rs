//! Write-set application

use dvm_primitives::WriteOp;
use dvm_storage::VmStore;

/// Apply `write_set` to `store` in order, the last op on a path wins
pub fn apply_write_set(store: &VmStore, write_set: &[WriteOp]) {
    for op in write_set {
        match op {
            WriteOp::Value { path, value } => store.set_value(path, value),
            WriteOp::Deletion { path } => store.del_value(path),
        }
    }

    tracing::debug!(ops = write_set.len(), "Write set applied");
}

//! Committed VM state using MDBX database

use crate::{
    kv::{Changeset, CommittedStore},
    tables::{StoredVmValue, VmKey, VmValues},
};
use eyre::Result;
use reth_db::DatabaseEnv;
use reth_db_api::{
    database::Database,
    transaction::{DbTx, DbTxMut},
};
use std::sync::Arc;

/// Committed VM state store
pub struct StateStore {
    db: Arc<DatabaseEnv>,
}

impl StateStore {
    /// Create new state store with database
    pub fn new(db: Arc<DatabaseEnv>) -> Self {
        Self { db }
    }

    /// Get committed value
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let tx = self.db.tx()?;
        let value = tx.get::<VmValues>(VmKey(key.to_vec()))?;
        Ok(value.map(|stored| stored.value))
    }

    /// Number of committed values
    pub fn len(&self) -> Result<usize> {
        let tx = self.db.tx()?;
        Ok(tx.entries::<VmValues>()?)
    }

    /// Whether nothing is committed yet
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl CommittedStore for StateStore {
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.get(key)
    }

    fn write_batch(&self, changes: &Changeset) -> Result<()> {
        let tx = self.db.tx_mut()?;

        for (key, value) in changes {
            match value {
                Some(value) => {
                    tx.put::<VmValues>(VmKey(key.clone()), StoredVmValue { value: value.clone() })?;
                }
                None => {
                    tx.delete::<VmValues>(VmKey(key.clone()), None)?;
                }
            }
        }

        tx.commit()?;
        Ok(())
    }
}

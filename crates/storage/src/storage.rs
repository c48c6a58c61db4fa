//! Combined storage wrapper

use crate::{state_store::StateStore, tables::VmTableSet};
use eyre::Result;
use reth_db::{mdbx::DatabaseArguments, mdbx::init_db_for, models::ClientVersion, DatabaseEnv};
use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

/// MDBX-backed VM storage
pub struct DvmStorage {
    /// Database environment
    pub db: Arc<DatabaseEnv>,
    /// Committed VM state
    pub state: Arc<StateStore>,
    /// Whether this is a new database
    is_new: AtomicBool,
}

impl DvmStorage {
    /// Create new storage from path
    pub fn new(path: &Path) -> Result<Self> {
        let db_path = path.join("mdbx.dat");
        let is_new = !db_path.exists();

        std::fs::create_dir_all(path)?;

        let db = init_db_for::<_, VmTableSet>(
            path,
            DatabaseArguments::new(ClientVersion::default()),
        )?;
        let db = Arc::new(db);

        let state = Arc::new(StateStore::new(Arc::clone(&db)));

        tracing::info!(path = %path.display(), is_new, "VM storage opened");

        Ok(Self { db, state, is_new: AtomicBool::new(is_new) })
    }

    /// Check if this is a new database
    pub fn is_new_database(&self) -> bool {
        self.is_new.load(Ordering::SeqCst)
    }

    /// Mark database as initialized
    pub fn mark_initialized(&self) {
        self.is_new.store(false, Ordering::SeqCst);
    }
}

//! VM storage
//!
//! Access-path key codec, key/value port and the MDBX-backed committed store

pub mod key;
pub mod kv;
pub mod state_store;
pub mod storage;
pub mod tables;
pub mod vm_store;
pub mod working_set;

pub use key::{KeyScheme, UnknownKeyScheme, KEY_DELIMITER, VM_KEY_PREFIX};
pub use kv::{Changeset, CommittedStore, KvStore, MemoryStore};
pub use state_store::StateStore;
pub use storage::DvmStorage;
pub use tables::{StoredVmValue, VmKey, VmTableSet, VmValues};
pub use vm_store::VmStore;
pub use working_set::WorkingSet;

//! VM database tables

use bytes::BufMut;
use reth_codecs::Compact;
use reth_db_api::table::{Compress, Decode, Decompress, Encode, Table, TableInfo};
use serde::{Deserialize, Serialize};

/// Table name constants
pub mod table_names {
    pub const VM_VALUES: &str = "VmValues";
}

/// Encoded access path key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct VmKey(pub Vec<u8>);

impl Encode for VmKey {
    type Encoded = Vec<u8>;

    fn encode(self) -> Self::Encoded {
        self.0
    }
}

impl Decode for VmKey {
    fn decode(value: &[u8]) -> Result<Self, reth_db_api::DatabaseError> {
        Ok(Self(value.to_vec()))
    }
}

/// Raw resource bytes written by the VM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StoredVmValue {
    pub value: Vec<u8>,
}

impl Compact for StoredVmValue {
    fn to_compact<B>(&self, buf: &mut B) -> usize
    where
        B: BufMut + AsMut<[u8]>,
    {
        buf.put_slice(&self.value);
        self.value.len()
    }

    fn from_compact(buf: &[u8], len: usize) -> (Self, &[u8]) {
        (Self { value: buf[..len].to_vec() }, &buf[len..])
    }
}

impl Compress for StoredVmValue {
    type Compressed = Vec<u8>;

    fn compress_to_buf<B: BufMut + AsMut<[u8]>>(&self, buf: &mut B) {
        self.to_compact(buf);
    }
}

impl Decompress for StoredVmValue {
    fn decompress(value: &[u8]) -> Result<Self, reth_db_api::DatabaseError> {
        let (stored, _) = Self::from_compact(value, value.len());
        Ok(stored)
    }
}

// Table definitions

/// VM values table: VmKey -> StoredVmValue
#[derive(Debug)]
pub struct VmValues;

impl Table for VmValues {
    const NAME: &'static str = table_names::VM_VALUES;
    const DUPSORT: bool = false;
    type Key = VmKey;
    type Value = StoredVmValue;
}

impl TableInfo for VmValues {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn is_dupsort(&self) -> bool {
        Self::DUPSORT
    }
}

/// TableSet implementation for VM tables
pub struct VmTableSet;

impl reth_db_api::TableSet for VmTableSet {
    fn tables() -> Box<dyn Iterator<Item = Box<dyn TableInfo>>> {
        Box::new(vec![Box::new(VmValues) as Box<dyn TableInfo>].into_iter())
    }
}

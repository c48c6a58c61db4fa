use alloy_primitives::{Address, FixedBytes};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Length of a VM address in bytes
pub const VM_ADDRESS_LENGTH: usize = 24;

/// Address errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// Wrong number of address bytes
    #[error("invalid address length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    /// Not a hex string
    #[error("invalid address hex: {0}")]
    InvalidHex(String),
}

/// VM account address
///
/// Ledger accounts are 20 bytes wide; the VM pads them to 24 bytes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VmAddress(pub FixedBytes<VM_ADDRESS_LENGTH>);

impl VmAddress {
    /// Reserved address holding ledger-global resources
    pub const ZERO: Self = Self(FixedBytes::ZERO);

    /// Create address from raw bytes
    pub const fn new(bytes: [u8; VM_ADDRESS_LENGTH]) -> Self {
        Self(FixedBytes::new(bytes))
    }

    /// Convert a ledger account address by appending four zero bytes
    pub fn from_account(account: Address) -> Self {
        let mut bytes = [0u8; VM_ADDRESS_LENGTH];
        bytes[..20].copy_from_slice(account.as_slice());
        Self::new(bytes)
    }

    /// Parse either a 24 byte VM address or a 20 byte account address from hex
    pub fn from_hex_lenient(s: &str) -> Result<Self, AddressError> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        match bytes.len() {
            20 => Ok(Self::from_account(Address::from_slice(&bytes))),
            _ => Self::try_from(bytes.as_slice()),
        }
    }

    /// Raw address bytes
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Whether this is the reserved zero address
    pub fn is_zero(&self) -> bool {
        self.0 == FixedBytes::ZERO
    }
}

impl TryFrom<&[u8]> for VmAddress {
    type Error = AddressError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        FixedBytes::try_from(bytes).map(Self).map_err(|_| AddressError::InvalidLength {
            expected: VM_ADDRESS_LENGTH,
            actual: bytes.len(),
        })
    }
}

impl From<Address> for VmAddress {
    fn from(account: Address) -> Self {
        Self::from_account(account)
    }
}

impl FromStr for VmAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Self::try_from(bytes.as_slice())
    }
}

impl fmt::Display for VmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_from_account_pads_with_zeros() {
        let account = address!("1111111111111111111111111111111111111111");
        let vm = VmAddress::from_account(account);

        assert_eq!(&vm.as_slice()[..20], account.as_slice());
        assert_eq!(&vm.as_slice()[20..], &[0u8; 4]);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let err = VmAddress::try_from([1u8; 20].as_slice()).unwrap_err();
        assert_eq!(err, AddressError::InvalidLength { expected: 24, actual: 20 });

        assert!("0x1234".parse::<VmAddress>().is_err());
        assert!("zz".parse::<VmAddress>().is_err());
    }

    #[test]
    fn test_lenient_hex_parsing() {
        let short =
            VmAddress::from_hex_lenient("0x2222222222222222222222222222222222222222").unwrap();
        assert_eq!(&short.as_slice()[20..], &[0u8; 4]);

        let full = VmAddress::from_hex_lenient(&"33".repeat(24)).unwrap();
        assert_eq!(full, VmAddress::new([0x33; 24]));
    }

    #[test]
    fn test_zero_address() {
        assert!(VmAddress::ZERO.is_zero());
        assert_eq!(VmAddress::default(), VmAddress::ZERO);
        assert!(!VmAddress::new([1; 24]).is_zero());
    }
}

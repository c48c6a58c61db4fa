//! Access path to storage key encoding
//!
//! Two layouts are supported:
//!
//! - `Canonical`: `"vm" 0x00 address path_len(u64 BE) path`. The address is fixed
//!   width and the path is length-prefixed, so no byte content can shift the
//!   boundary between fields.
//! - `Legacy`: `"vm" ':' address ':' path`, kept for byte compatibility with
//!   stores written by earlier nodes. It stays unambiguous only because the
//!   address type guarantees a fixed width.
//!
//! The third byte differs between the layouts, so keys of both schemes never
//! collide inside one table.

use dvm_primitives::{AccessPath, VM_ADDRESS_LENGTH};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Module namespace every VM key starts with
pub const VM_KEY_PREFIX: &[u8] = b"vm";

/// Field delimiter of the legacy layout
pub const KEY_DELIMITER: u8 = b':';

const CANONICAL_TAG: u8 = 0x00;

/// Storage key layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyScheme {
    /// Length-prefixed layout
    #[default]
    Canonical,
    /// Delimiter-joined layout
    Legacy,
}

impl KeyScheme {
    /// Encode an access path into a storage key
    pub fn encode(&self, access_path: &AccessPath) -> Vec<u8> {
        let address = access_path.address.as_slice();
        let path = access_path.path.as_ref();

        let capacity = VM_KEY_PREFIX.len() + VM_ADDRESS_LENGTH + path.len() + 10;
        let mut key = Vec::with_capacity(capacity);
        key.extend_from_slice(VM_KEY_PREFIX);

        match self {
            Self::Canonical => {
                key.push(CANONICAL_TAG);
                key.extend_from_slice(address);
                key.extend_from_slice(&(path.len() as u64).to_be_bytes());
                key.extend_from_slice(path);
            }
            Self::Legacy => {
                key.push(KEY_DELIMITER);
                key.extend_from_slice(address);
                key.push(KEY_DELIMITER);
                key.extend_from_slice(path);
            }
        }

        key
    }
}

impl fmt::Display for KeyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canonical => f.write_str("canonical"),
            Self::Legacy => f.write_str("legacy"),
        }
    }
}

/// Unknown key scheme name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key scheme {0:?}, expected \"canonical\" or \"legacy\"")]
pub struct UnknownKeyScheme(pub String);

impl FromStr for KeyScheme {
    type Err = UnknownKeyScheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "canonical" => Ok(Self::Canonical),
            "legacy" => Ok(Self::Legacy),
            other => Err(UnknownKeyScheme(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dvm_primitives::VmAddress;
    use std::collections::HashMap;

    fn ap(address: u8, path: &[u8]) -> AccessPath {
        AccessPath::new(VmAddress::new([address; 24]), path.to_vec())
    }

    #[test]
    fn test_canonical_layout() {
        let key = KeyScheme::Canonical.encode(&ap(0x11, b"ab"));

        assert_eq!(&key[..3], b"vm\x00");
        assert_eq!(&key[3..27], &[0x11; 24]);
        assert_eq!(&key[27..35], &2u64.to_be_bytes());
        assert_eq!(&key[35..], b"ab");
    }

    #[test]
    fn test_legacy_layout() {
        let key = KeyScheme::Legacy.encode(&ap(0x22, b"xy"));

        let mut expected = b"vm:".to_vec();
        expected.extend_from_slice(&[0x22; 24]);
        expected.push(b':');
        expected.extend_from_slice(b"xy");
        assert_eq!(key, expected);
    }

    #[test]
    fn test_injective_with_delimiters_in_fields() {
        // Paths that embed delimiter bytes and look like address/path splits
        let inputs = [
            ap(0x3a, b""),
            ap(0x3a, b":"),
            ap(0x3a, b"::"),
            ap(0x3a, b"\x00"),
            ap(0x3a, b"\x00\x00\x00\x01:"),
            ap(0x00, b":"),
            ap(0x00, b""),
            ap(0x00, b"\x00"),
        ];

        for scheme in [KeyScheme::Canonical, KeyScheme::Legacy] {
            let mut seen = HashMap::new();
            for input in &inputs {
                if let Some(previous) = seen.insert(scheme.encode(input), input.clone()) {
                    panic!("{scheme}: {previous} and {input} share a key");
                }
            }
        }
    }

    #[test]
    fn test_schemes_do_not_overlap() {
        let path = ap(0x01, b"p");
        assert_ne!(KeyScheme::Canonical.encode(&path), KeyScheme::Legacy.encode(&path));
    }

    #[test]
    fn test_scheme_parsing() {
        assert_eq!("canonical".parse::<KeyScheme>().unwrap(), KeyScheme::Canonical);
        assert_eq!("legacy".parse::<KeyScheme>().unwrap(), KeyScheme::Legacy);
        assert!("other".parse::<KeyScheme>().is_err());
    }
}

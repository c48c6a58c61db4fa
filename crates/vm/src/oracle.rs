//! Oracle price resource location

use dvm_primitives::AccessPath;
use sha3::{Digest, Sha3_256};
use xxhash_rust::xxh64::xxh64;

/// First path byte of oracle price resources
pub const ORACLE_PATH_PREFIX: u8 = 0xff;

/// Access path of the price resource for `asset_code`.
///
/// The path is `0xff || sha3_256(le_u64(xxh64(asset_code, 0)))` under the zero address.
/// The asset code is hashed as given, without case folding.
pub fn oracle_access_path(asset_code: &str) -> AccessPath {
    let ticker = xxh64(asset_code.as_bytes(), 0);
    let hash = Sha3_256::digest(ticker.to_le_bytes());

    let mut path = Vec::with_capacity(1 + hash.len());
    path.push(ORACLE_PATH_PREFIX);
    path.extend_from_slice(&hash);

    AccessPath::global(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eth_usdt_path() {
        let path = oracle_access_path("eth_usdt");

        assert!(path.address.is_zero());
        assert_eq!(
            hex::encode(&path.path),
            "ffe300b84cc0315d7a963b504ca77202c8c38cd28bad5bce7bbe0301c806666200"
        );
    }

    #[test]
    fn test_asset_code_is_case_sensitive() {
        assert_ne!(oracle_access_path("eth_usdt"), oracle_access_path("ETH_USDT"));
    }
}

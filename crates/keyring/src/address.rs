//! Chain address helpers.

use did_core::error::{Context, Err};
use did_core::Result;
use k256::ecdsa::VerifyingKey;
use sha3::{Digest, Keccak256};

// version byte + network id (at least one byte) + address + checksum
const MNID_MIN_LEN: usize = 1 + 1 + 20 + 4;
const MNID_VERSION: u8 = 0x01;

/// Derive the lowercase, `0x` prefixed chain address for a SEC1 encoded public key
/// (compressed or uncompressed).
///
/// # Errors
///
/// * `Err::InvalidKey` - the bytes are not a secp256k1 public key.
pub fn to_ethereum_address(public_key: &[u8]) -> Result<String> {
    let vk = VerifyingKey::from_sec1_bytes(public_key).context(Err::InvalidKey)?;
    Ok(address_of(&vk))
}

pub(crate) fn address_of(vk: &VerifyingKey) -> String {
    let point = vk.to_encoded_point(false);
    let hash = Keccak256::digest(&point.as_bytes()[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

/// Returns `true` if `address` is a `0x` prefixed, 20-byte hex address.
#[must_use]
pub fn is_eth_address(address: &str) -> bool {
    address.strip_prefix("0x").is_some_and(|hex| {
        hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit())
    })
}

/// Returns `true` if `address` has the shape of a legacy chain-qualified identifier
/// (MNID): base58 encoding of a version byte, network id, address and checksum.
#[must_use]
pub fn is_mnid(address: &str) -> bool {
    bs58::decode(address)
        .into_vec()
        .is_ok_and(|bytes| bytes.len() >= MNID_MIN_LEN && bytes[0] == MNID_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;

    #[test]
    fn address_from_public_key() {
        let kp = KeyPair::generate();
        let address = to_ethereum_address(&kp.public_key()).expect("should derive");
        assert_eq!(address, kp.address());
        assert!(is_eth_address(&address));
        assert!(!is_mnid(&address));
    }

    #[test]
    fn mnid_shape() {
        assert!(is_mnid("2nQtiQG6Cgm1GYTBaaKAgr76uY7iSexUkqX"));
        assert!(is_mnid("5A8bRWU3F7j3REx3vkJWxdjQPp4tqmxFPmab1Tr"));
        assert!(!is_mnid("0x00521965e7bd230323c423d96c657db5b79d099f"));
        assert!(!is_mnid("not an mnid"));
    }

    #[test]
    fn eth_address_shape() {
        assert!(is_eth_address("0x00521965e7bd230323c423d96c657db5b79d099f"));
        assert!(!is_eth_address("0x00521965e7bd230323c423d96c657db5b79d099"));
        assert!(!is_eth_address("00521965e7bd230323c423d96c657db5b79d099f00"));
    }
}

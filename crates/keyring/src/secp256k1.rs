use base64ct::{Base64UrlUnpadded, Encoding};
use did_core::error::{Context, Err};
use did_core::{tracerr, Algorithm, Jwk, Result};
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::PublicKey;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::address;

/// Key pair for secp256k1.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generate a new key pair.
    #[must_use]
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        let verifying_key = *signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Import a key pair from a hex encoded 32-byte private key, with or without a `0x`
    /// prefix.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidKey` - the string is not a valid secp256k1 private key.
    pub fn from_hex(private_key: &str) -> Result<Self> {
        let encoded = private_key.trim_start_matches("0x");
        let Ok(bytes) = hex::decode(encoded) else {
            tracerr!(Err::InvalidKey, "Private key is not hex encoded");
        };
        if bytes.len() != 32 {
            tracerr!(
                Err::InvalidKey,
                "Invalid private key length. Expected 32 bytes, got {}",
                bytes.len()
            );
        }
        let signing_key = SigningKey::from_slice(&bytes)?;
        let verifying_key = *signing_key.verifying_key();
        Ok(Self {
            signing_key,
            verifying_key,
        })
    }

    /// The private key as 64 lowercase hex characters.
    #[must_use]
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// The uncompressed SEC1 public key.
    #[must_use]
    pub fn public_key(&self) -> Vec<u8> {
        self.verifying_key.to_encoded_point(false).as_bytes().to_vec()
    }

    /// The uncompressed SEC1 public key, hex encoded.
    #[must_use]
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key())
    }

    /// The lowercase `0x` prefixed chain address controlled by this key.
    #[must_use]
    pub fn address(&self) -> String {
        address::address_of(&self.verifying_key)
    }

    /// Express the public key as a JWK.
    ///
    /// # Errors
    ///
    /// * `Err::SerializationError` - the key could not be rendered as a JWK.
    pub fn to_jwk(&self) -> Result<Jwk> {
        let public_key = PublicKey::from(self.verifying_key);
        let jwk = public_key.to_jwk_string();
        serde_json::from_str(&jwk).context(Err::SerializationError)
    }

    /// Sign the SHA-256 digest of a message.
    ///
    /// # Errors
    ///
    /// * `Err::SigningError` - the signature could not be created.
    pub fn sign(&self, msg: &[u8], alg: Algorithm) -> Result<Vec<u8>> {
        let digest: [u8; 32] = Sha256::digest(msg).into();
        let (sig, recid) = match self.signing_key.sign_prehash_recoverable(&digest) {
            Ok(signed) => signed,
            Err(e) => tracerr!(Err::SigningError, "Error signing message: {}", e),
        };

        let mut bytes = sig.to_bytes().to_vec();
        if alg == Algorithm::Es256kR {
            bytes.push(recid.to_byte());
        }
        Ok(bytes)
    }
}

/// Verify an `r || s` signature (any trailing recovery byte is ignored) over the SHA-256
/// digest of `msg` with a SEC1 encoded public key.
///
/// # Errors
///
/// * `Err::FailedSignatureVerification` - the signature does not match.
pub fn verify_signature(public_key: &[u8], msg: &[u8], sig: &[u8]) -> Result<()> {
    let vk = VerifyingKey::from_sec1_bytes(public_key).context(Err::InvalidKey)?;
    let sig = parse_signature(sig)?;
    let digest: [u8; 32] = Sha256::digest(msg).into();

    match vk.verify_prehash(&digest, &sig) {
        Ok(()) => Ok(()),
        Err(e) => tracerr!(Err::FailedSignatureVerification, "Error verifying signature: {}", e),
    }
}

/// Recover the candidate public keys (uncompressed SEC1) that could have produced the
/// signature. A 65-byte signature yields a single candidate from its recovery byte; a
/// 64-byte signature yields one candidate per recovery id.
///
/// # Errors
///
/// * `Err::FailedSignatureVerification` - the signature is malformed or no key can be
///   recovered.
pub fn recover_public_keys(msg: &[u8], sig: &[u8]) -> Result<Vec<Vec<u8>>> {
    let signature = parse_signature(sig)?;
    let digest: [u8; 32] = Sha256::digest(msg).into();

    let recovery_ids = match sig.get(64) {
        // legacy signers add 27 to the recovery parameter
        Some(v) => {
            let v = if *v >= 27 { v - 27 } else { *v };
            RecoveryId::from_byte(v).into_iter().collect()
        }
        None => vec![RecoveryId::new(false, false), RecoveryId::new(true, false)],
    };

    let keys: Vec<Vec<u8>> = recovery_ids
        .into_iter()
        .filter_map(|recid| VerifyingKey::recover_from_prehash(&digest, &signature, recid).ok())
        .map(|vk| vk.to_encoded_point(false).as_bytes().to_vec())
        .collect();

    if keys.is_empty() {
        tracerr!(Err::FailedSignatureVerification, "Unable to recover public key from signature");
    }
    Ok(keys)
}

/// Convert a secp256k1 JWK into an uncompressed SEC1 public key.
///
/// # Errors
///
/// * `Err::InvalidKey` - the JWK is not a valid secp256k1 key.
pub fn public_key_from_jwk(jwk: &Jwk) -> Result<Vec<u8>> {
    jwk.check_secp256k1()?;
    let x = Base64UrlUnpadded::decode_vec(jwk.x.as_deref().unwrap_or_default())?;
    let y = Base64UrlUnpadded::decode_vec(jwk.y.as_deref().unwrap_or_default())?;
    if x.len() != 32 || y.len() != 32 {
        tracerr!(Err::InvalidKey, "Invalid coordinate length. Expected 32 bytes");
    }
    Ok([&[0x04], x.as_slice(), y.as_slice()].concat())
}

fn parse_signature(sig: &[u8]) -> Result<Signature> {
    let Some(rs) = sig.get(..64) else {
        tracerr!(
            Err::FailedSignatureVerification,
            "Invalid signature length. Expected at least 64 bytes, got {}",
            sig.len()
        );
    };
    match Signature::from_slice(rs) {
        Ok(signature) => Ok(signature),
        Err(e) => tracerr!(Err::FailedSignatureVerification, "Invalid signature: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let kp = KeyPair::generate();
        let hex = kp.private_key_hex();
        assert_eq!(hex.len(), 64);

        let imported = KeyPair::from_hex(&format!("0x{hex}")).expect("should import");
        assert_eq!(imported.public_key_hex(), kp.public_key_hex());
        assert_eq!(imported.address(), kp.address());
    }

    #[test]
    fn reject_short_key() {
        let err = KeyPair::from_hex("abcd").expect_err("should fail");
        assert!(err.is(Err::InvalidKey));
    }

    #[test]
    fn sign_verify() {
        let kp = KeyPair::generate();
        let msg = b"header.payload";

        let sig = kp.sign(msg, Algorithm::Es256k).expect("should sign");
        assert_eq!(sig.len(), 64);
        verify_signature(&kp.public_key(), msg, &sig).expect("should verify");

        let other = KeyPair::generate();
        let err = verify_signature(&other.public_key(), msg, &sig).expect_err("wrong key");
        assert!(err.is(Err::FailedSignatureVerification));
    }

    #[test]
    fn recover() {
        let kp = KeyPair::generate();
        let msg = b"header.payload";

        let sig = kp.sign(msg, Algorithm::Es256kR).expect("should sign");
        assert_eq!(sig.len(), 65);
        let keys = recover_public_keys(msg, &sig).expect("should recover");
        assert_eq!(keys, vec![kp.public_key()]);

        // without the recovery byte every candidate is returned
        let keys = recover_public_keys(msg, &sig[..64]).expect("should recover");
        assert!(keys.contains(&kp.public_key()));
    }

    #[test]
    fn jwk_public_key() {
        let kp = KeyPair::generate();
        let jwk = kp.to_jwk().expect("should convert");
        assert_eq!(jwk.crv.as_deref(), Some("secp256k1"));
        assert_eq!(public_key_from_jwk(&jwk).expect("should convert"), kp.public_key());
    }
}

use async_trait::async_trait;
use did_core::{Algorithm, Result, Signer};

use crate::KeyPair;

/// Signer over a single secp256k1 key pair held in memory.
#[derive(Clone, Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct KeyPairSigner {
    key: KeyPair,
}

impl KeyPairSigner {
    /// Create a new `KeyPairSigner` instance.
    #[must_use]
    pub const fn new(key: KeyPair) -> Self {
        Self { key }
    }

    /// Create a signer from a hex encoded private key.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidKey` - the private key is not a valid secp256k1 key.
    pub fn from_hex(private_key: &str) -> Result<Self> {
        Ok(Self::new(KeyPair::from_hex(private_key)?))
    }

    /// The key pair used for signing.
    #[must_use]
    pub const fn key(&self) -> &KeyPair {
        &self.key
    }
}

#[async_trait]
impl Signer for KeyPairSigner {
    fn supported_algorithms(&self) -> Vec<Algorithm> {
        vec![Algorithm::Es256kR, Algorithm::Es256k]
    }

    async fn try_sign(&self, msg: &[u8], alg: Algorithm) -> Result<Vec<u8>> {
        let alg = self.algorithm(alg)?;
        self.key.sign(msg, alg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{recover_public_keys, verify_signature};

    #[tokio::test]
    async fn test_signer() {
        let signer = KeyPairSigner::new(KeyPair::generate());
        let msg = b"Hello, world!";

        let sig = signer.try_sign(msg, Algorithm::Es256k).await.expect("should sign");
        verify_signature(&signer.key().public_key(), msg, &sig).expect("failed to verify");

        let sig = signer.try_sign(msg, Algorithm::Es256kR).await.expect("should sign");
        let keys = recover_public_keys(msg, &sig).expect("should recover");
        assert_eq!(keys[0], signer.key().public_key());
    }
}

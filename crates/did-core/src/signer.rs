//! Message signer trait.

use async_trait::async_trait;

use crate::error::Err;
use crate::{tracerr, Algorithm, Result};

/// Message signer. The assumption is the implementer of the trait will have key
/// information stored in the structure, or proxy to a remote signing service. How the
/// message is hashed before signing is up to the implementer as long as it matches the
/// algorithm: both supported algorithms sign the SHA-256 digest of the message.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Type of key signatures supported by this signer.
    fn supported_algorithms(&self) -> Vec<Algorithm>;

    /// Reconcile the requested algorithm with the supported algorithms, returning an error
    /// if the requested algorithm is not supported.
    ///
    /// # Errors
    ///
    /// * `Err::UnsupportedAlgorithm` - The signer cannot produce signatures for `alg`.
    fn algorithm(&self, alg: Algorithm) -> Result<Algorithm> {
        if self.supported_algorithms().contains(&alg) {
            return Ok(alg);
        }
        tracerr!(Err::UnsupportedAlgorithm, "Unsupported signing algorithm: {alg}")
    }

    /// Sign the provided message bytestring.
    ///
    /// Returns the raw signature: `r || s` for `ES256K` and `r || s || v` for `ES256K-R`.
    async fn try_sign(&self, msg: &[u8], alg: Algorithm) -> Result<Vec<u8>>;
}

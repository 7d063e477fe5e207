//! # Configuration
//!
//! Constructor options for [`crate::Credentials`]. Only the combinations described on
//! [`crate::identity::resolve`] are accepted.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use did_core::error::Err;
use did_core::{tracerr, Resolver, Result, Signer};
pub use did_ethr::NetworkConfig;
use serde_json::Value;

/// Identity configuration.
#[derive(Clone, Default)]
pub struct Config {
    pub(crate) private_key: Option<String>,
    pub(crate) did: Option<String>,
    pub(crate) address: Option<String>,
    pub(crate) signer: Option<Arc<dyn Signer>>,
    pub(crate) resolver: Option<Arc<dyn Resolver>>,
    pub(crate) networks: Vec<(String, NetworkConfig)>,
}

impl Config {
    /// Create an empty configuration. Without further options the resulting identity can
    /// only verify tokens that do not require an audience.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hex encoded secp256k1 private key used to sign tokens.
    #[must_use]
    pub fn private_key(mut self, private_key: impl Into<String>) -> Self {
        self.private_key = Some(private_key.into());
        self
    }

    /// The DID of the identity.
    #[must_use]
    pub fn did(mut self, did: impl Into<String>) -> Self {
        self.did = Some(did.into());
        self
    }

    /// Chain address (or legacy MNID) the DID is derived from.
    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// An externally provided signer, such as a remote signing service.
    #[must_use]
    pub fn signer(mut self, signer: impl Signer + 'static) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    /// A DID resolver replacing the default `ethr` + `web` resolver.
    #[must_use]
    pub fn resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Add a network, keyed by network identifier (`mainnet`, `0x4`, `1337`, ...).
    /// Validated when the configuration is resolved.
    #[must_use]
    pub fn network(mut self, id: impl Into<String>, config: NetworkConfig) -> Self {
        self.networks.push((id.into(), config));
        self
    }

    /// Add networks from a loosely typed mapping of network identifier to
    /// `{rpcUrl, registryAddress}`.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - the value is not an object or an entry is malformed.
    pub fn networks(mut self, networks: &Value) -> Result<Self> {
        let Some(entries) = networks.as_object() else {
            tracerr!(Err::InvalidConfig, "networks must be an object keyed by network id");
        };
        for (id, value) in entries {
            self.networks.push((id.clone(), NetworkConfig::from_value(value)?));
        }
        Ok(self)
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("private_key", &self.private_key.as_ref().map(|_| "[redacted]"))
            .field("did", &self.did)
            .field("address", &self.address)
            .field("signer", &self.signer.is_some())
            .field("resolver", &self.resolver.is_some())
            .field("networks", &self.networks)
            .finish()
    }
}

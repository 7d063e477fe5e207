//! # Identity
//!
//! Turns constructor configuration (a raw key, a chain address, a legacy MNID or an
//! externally supplied signer and resolver) into a canonical [`Identity`].

use std::fmt::{Debug, Formatter};
use std::sync::{Arc, LazyLock};

use did_core::error::Err;
use did_core::{tracerr, Algorithm, MethodResolver, Resolver, Result, Signer};
use did_ethr::{EthrResolver, Networks};
use did_web::WebResolver;
use keyring::{KeyPair, KeyPairSigner};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::Config;

static DID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^did:[a-z0-9]+:(?:[A-Za-z0-9._%-]*:)*[A-Za-z0-9._%-]+$").expect("should compile")
});

/// The identity on whose behalf tokens are signed and for whom responses are verified.
#[derive(Clone)]
pub struct Identity {
    did: Option<String>,
    signer: Option<Arc<dyn Signer>>,
    resolver: Arc<dyn Resolver>,
    networks: Networks,
}

impl Identity {
    /// The identity's DID, if configured.
    #[must_use]
    pub fn did(&self) -> Option<&str> {
        self.did.as_deref()
    }

    /// The signer, if signing is possible.
    #[must_use]
    pub fn signer(&self) -> Option<&dyn Signer> {
        self.signer.as_deref()
    }

    /// The DID resolver.
    #[must_use]
    pub fn resolver(&self) -> &dyn Resolver {
        self.resolver.as_ref()
    }

    /// Configured networks. Networks added here are visible to the default resolver.
    #[must_use]
    pub const fn networks(&self) -> &Networks {
        &self.networks
    }

    /// Signature algorithm for tokens issued by this identity: plain `ES256K` for legacy
    /// `did:uport` identities, recoverable `ES256K-R` otherwise.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        match &self.did {
            Some(did) if did.starts_with("did:uport:") => Algorithm::Es256k,
            _ => Algorithm::Es256kR,
        }
    }
}

impl Debug for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("did", &self.did)
            .field("signer", &self.signer.is_some())
            .field("networks", &self.networks.ids())
            .finish_non_exhaustive()
    }
}

/// Resolve configuration into an identity.
///
/// - `signer` and `did` are used as-is.
/// - `private_key` creates a signer; without `did` the DID is `did:ethr:<address>` for the
///   key's address.
/// - `address` without `did` gives `did:uport:<mnid>` for a legacy MNID, otherwise
///   `did:ethr:<address>`.
/// - `resolver` is used as-is, otherwise `ethr` and `web` DIDs are resolved.
///
/// No network calls are made.
///
/// # Errors
///
/// * `Err::InvalidConfig` - options are malformed or contradict each other: a signer and a
///   private key, a DID and an address (or key) naming different identities, or a signer
///   without a DID.
pub fn resolve(config: Config) -> Result<Identity> {
    let Config {
        private_key,
        did,
        address,
        signer,
        resolver,
        networks: network_list,
    } = config;

    if private_key.is_some() && signer.is_some() {
        tracerr!(Err::InvalidConfig, "Conflicting options: both signer and privateKey configured");
    }
    let key_signer = private_key.as_deref().map(KeyPairSigner::from_hex).transpose()?;
    let key_address = key_signer.as_ref().map(|s| s.key().address());

    let address_did = match &address {
        Some(address) => {
            if let Some(key_address) = &key_address {
                if keyring::is_eth_address(address) && !address.eq_ignore_ascii_case(key_address)
                {
                    tracerr!(
                        Err::InvalidConfig,
                        "privateKey does not control address: {address} !== {key_address}"
                    );
                }
            }
            Some(did_for_address(address)?)
        }
        None => None,
    };

    let did = match (did, address_did) {
        (Some(did), Some(from_address)) if !did.eq_ignore_ascii_case(&from_address) => {
            tracerr!(
                Err::InvalidConfig,
                "Conflicting options: did {did} !== address {from_address}"
            );
        }
        (Some(did), _) => Some(did),
        (None, Some(from_address)) => Some(from_address),
        (None, None) => key_address.as_deref().map(did_ethr::did_from_address),
    };

    if let Some(did) = &did {
        if !DID_REGEX.is_match(did) {
            tracerr!(Err::InvalidConfig, "Invalid DID: {did}");
        }
    } else if signer.is_some() {
        tracerr!(Err::InvalidConfig, "A signer was configured without a did");
    }

    let networks = Networks::new();
    for (id, network) in network_list {
        networks.insert(&id, network)?;
    }

    let signer = key_signer.map(|s| Arc::new(s) as Arc<dyn Signer>).or(signer);
    let resolver = resolver.unwrap_or_else(|| Arc::new(default_resolver(&networks)));

    tracing::debug!(did = ?did, signer = signer.is_some(), "resolved identity");
    Ok(Identity {
        did,
        signer,
        resolver,
        networks,
    })
}

/// The default resolver: `did:ethr` (over the supplied networks) merged with `did:web`.
#[must_use]
pub fn default_resolver(networks: &Networks) -> MethodResolver {
    MethodResolver::new()
        .method("ethr", EthrResolver::new(networks.clone()))
        .method("web", WebResolver::default())
}

fn did_for_address(address: &str) -> Result<String> {
    if keyring::is_mnid(address) {
        return Ok(format!("did:uport:{address}"));
    }
    if keyring::is_eth_address(address) {
        return Ok(did_ethr::did_from_address(address));
    }
    tracerr!(Err::InvalidConfig, "Invalid address: {address}")
}

/// A newly created identity.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewIdentity {
    /// `did:ethr` DID for the key's address.
    pub did: String,

    /// Hex encoded private key (64 characters, no prefix).
    pub private_key: String,
}

/// Create a new key pair and the `did:ethr` DID it controls. Nothing is registered
/// anywhere.
#[must_use]
pub fn create_identity() -> NewIdentity {
    let kp = KeyPair::generate();
    NewIdentity {
        did: did_ethr::did_from_address(&kp.address()),
        private_key: kp.private_key_hex(),
    }
}

//! # DID Ethr Implementation
//! <https://github.com/decentralized-identity/ethr-did-resolver/blob/master/doc/did-method-spec.md>
//!
//! An `ethr` DID is created from a chain address or public key without any on-chain
//! transaction. Until the registry contract records changes for the identifier, its DID
//! document is fully determined by the DID and the network's chain id, which is the
//! document this resolver produces.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

mod network;
mod resolver;

pub use network::{chain_id, NetworkConfig, Networks, DEFAULT_NETWORK};
pub use resolver::EthrResolver;

/// Build the `did:ethr` DID for a chain address on the default network.
#[must_use]
pub fn did_from_address(address: &str) -> String {
    format!("did:ethr:{}", address.to_lowercase())
}

//! `Signer` implementation for secp256k1 keys held in memory, plus the signature
//! verification, public key recovery and address helpers needed to check `ES256K` and
//! `ES256K-R` signed tokens.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

mod address;
mod secp256k1;
mod signer;

pub use address::{is_eth_address, is_mnid, to_ethereum_address};
pub use secp256k1::{public_key_from_jwk, recover_public_keys, verify_signature, KeyPair};
pub use signer::KeyPairSigner;

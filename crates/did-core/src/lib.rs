//! # DID Core
//! Types, traits and functions shared by the DID method resolvers, the key ring and the
//! credentials crate: errors, signing and resolution capabilities, and DID documents.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod document;
pub mod error;
mod keys;
mod resolver;
mod signer;

pub use document::{DidDocument, VerificationMethod};
pub use keys::{Algorithm, Jwk};
pub use resolver::{method, MethodResolver, Resolver};
pub use signer::Signer;

/// Result type for DID Core.
pub type Result<T, E = error::Error> = core::result::Result<T, E>;

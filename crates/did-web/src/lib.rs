//! # DID Web Implementation
//! <https://w3c-ccg.github.io/did-method-web/>

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// DID Web resolver. Implementation of the DID Read operation.
mod resolver;

pub use resolver::{document_url, WebResolver};

//! Definition for a DID document resolver.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Err;
use crate::{tracerr, DidDocument, Result};

/// A Resolver is responsible for resolving a DID to a DID document. Implementations may
/// fetch the document over the network, read it from a ledger or derive it from the DID
/// itself.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve the DID to its current DID document.
    ///
    /// # Errors
    ///
    /// Returns an error if the DID is not supported or cannot be resolved.
    async fn resolve(&self, did: &str) -> Result<DidDocument>;
}

/// Extract the method name from a DID (`ethr` for `did:ethr:0x..`).
///
/// # Errors
///
/// * `Err::InvalidFormat` - the string is not a DID.
pub fn method(did: &str) -> Result<&str> {
    let mut parts = did.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("did"), Some(method), Some(id)) if !method.is_empty() && !id.is_empty() => {
            Ok(method)
        }
        _ => tracerr!(Err::InvalidFormat, "Invalid DID: {did}"),
    }
}

/// Resolver that merges resolvers for individual DID methods, dispatching on the
/// method name of the DID being resolved.
#[derive(Clone, Default)]
pub struct MethodResolver {
    methods: HashMap<String, Arc<dyn Resolver>>,
}

impl MethodResolver {
    /// Create an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the resolver for a DID method, replacing any existing one.
    #[must_use]
    pub fn method(mut self, name: impl Into<String>, resolver: impl Resolver + 'static) -> Self {
        self.methods.insert(name.into(), Arc::new(resolver));
        self
    }

    /// Names of the registered methods.
    #[must_use]
    pub fn methods(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[async_trait]
impl Resolver for MethodResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument> {
        let name = method(did)?;
        let Some(resolver) = self.methods.get(name) else {
            tracerr!(Err::NotSupported, "Unsupported DID method: '{name}'");
        };
        tracing::debug!(did, "resolving DID");
        resolver.resolve(did).await
    }
}

//! Network configuration for `ethr` DIDs.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

use did_core::error::Err;
use did_core::{tracerr, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static REGISTRY_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^0x[0-9a-fA-F]{40}$").expect("should compile"));

/// Network assumed when a DID does not name one.
pub const DEFAULT_NETWORK: &str = "mainnet";

const NAMED_NETWORKS: [(&str, u64); 6] = [
    ("mainnet", 1),
    ("ropsten", 3),
    ("rinkeby", 4),
    ("goerli", 5),
    ("kovan", 42),
    ("sepolia", 11_155_111),
];

/// Returns `true` if the network identifier names a well-known public chain, by name or
/// by chain id.
pub(crate) fn is_well_known(network: &str) -> bool {
    chain_id(network).is_ok_and(|id| NAMED_NETWORKS.iter().any(|(_, known)| *known == id))
}

/// Connection details for the DID registry on a chain.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    /// JSON-RPC endpoint of a node on the network.
    pub rpc_url: String,

    /// Address of the DID registry contract.
    pub registry_address: String,
}

impl NetworkConfig {
    /// Create a new network configuration.
    pub fn new(rpc_url: impl Into<String>, registry_address: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            registry_address: registry_address.into(),
        }
    }

    /// Parse and validate loosely typed configuration, such as a value read from a JSON
    /// file.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - a field is missing, is not a string or fails validation.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Some(obj) = value.as_object() else {
            tracerr!(Err::InvalidConfig, "Network config must be an object");
        };
        let Some(rpc_url) = obj.get("rpcUrl").and_then(Value::as_str) else {
            tracerr!(Err::InvalidConfig, "Network config must include 'rpcUrl' string");
        };
        let Some(registry_address) = obj.get("registryAddress").and_then(Value::as_str) else {
            tracerr!(Err::InvalidConfig, "Network config must include 'registryAddress' string");
        };

        let config = Self::new(rpc_url, registry_address);
        config.validate()?;
        Ok(config)
    }

    /// Check the shape of the configuration. Reachability of the RPC endpoint is not
    /// checked.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - `rpcUrl` is not a URL or `registryAddress` is not an
    ///   address.
    pub fn validate(&self) -> Result<()> {
        if url::Url::parse(&self.rpc_url).is_err() {
            tracerr!(Err::InvalidConfig, "Invalid rpcUrl: '{}'", self.rpc_url);
        }
        if !REGISTRY_ADDRESS.is_match(&self.registry_address) {
            tracerr!(Err::InvalidConfig, "Invalid registryAddress: '{}'", self.registry_address);
        }
        Ok(())
    }
}

/// Resolve a network identifier (a well-known name, `0x` prefixed hex or decimal chain
/// id) to its chain id.
///
/// # Errors
///
/// * `Err::InvalidConfig` - the identifier is not a known name or a chain id.
pub fn chain_id(network: &str) -> Result<u64> {
    if let Some((_, id)) = NAMED_NETWORKS.iter().find(|(name, _)| *name == network) {
        return Ok(*id);
    }
    let parsed = network.strip_prefix("0x").map_or_else(
        || network.parse::<u64>().ok(),
        |hex| u64::from_str_radix(hex, 16).ok(),
    );
    match parsed {
        Some(id) => Ok(id),
        None => tracerr!(Err::InvalidConfig, "Unknown network: '{network}'"),
    }
}

/// Configured networks, keyed by chain id so a network added as `1337` is found as `0x539`.
/// Clones share the same underlying map so networks added after construction are visible
/// to every holder.
#[derive(Clone, Debug, Default)]
pub struct Networks(Arc<RwLock<HashMap<u64, NetworkConfig>>>);

impl Networks {
    /// Create an empty set of networks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and add (or replace) a network.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - the identifier is not a chain id or the configuration fails
    ///   validation.
    pub fn insert(&self, network: &str, config: NetworkConfig) -> Result<()> {
        let chain = chain_id(network)?;
        config.validate()?;
        tracing::debug!(network, chain, rpc_url = %config.rpc_url, "adding network");
        self.0.write().expect("lock on networks poisoned").insert(chain, config);
        Ok(())
    }

    /// Configuration for a network, by name or chain id, if present.
    #[must_use]
    pub fn get(&self, network: &str) -> Option<NetworkConfig> {
        let chain = chain_id(network).ok()?;
        self.0.read().expect("lock on networks poisoned").get(&chain).cloned()
    }

    /// Returns `true` if the network, by name or chain id, has been configured.
    #[must_use]
    pub fn contains(&self, network: &str) -> bool {
        chain_id(network).is_ok_and(|chain| {
            self.0.read().expect("lock on networks poisoned").contains_key(&chain)
        })
    }

    /// Chain ids of the configured networks, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> =
            self.0.read().expect("lock on networks poisoned").keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const REGISTRY: &str = "0xdca7ef03e98e0dc2b855be647c39abe984fcf21b";

    #[test]
    fn chain_ids() {
        assert_eq!(chain_id("mainnet").expect("named"), 1);
        assert_eq!(chain_id("0x4").expect("hex"), 4);
        assert_eq!(chain_id("1337").expect("decimal"), 1337);
        assert!(chain_id("private").is_err());
    }

    #[test]
    fn config_shape() {
        let config = NetworkConfig::from_value(&json!({
            "rpcUrl": "http://localhost:8545",
            "registryAddress": REGISTRY
        }))
        .expect("should parse");
        assert_eq!(config.rpc_url, "http://localhost:8545");

        let err = NetworkConfig::from_value(&json!({"rpcUrl": 8545, "registryAddress": REGISTRY}))
            .expect_err("should fail");
        assert_eq!(err.to_string(), "Network config must include 'rpcUrl' string");

        let err =
            NetworkConfig::new("http://localhost:8545", "0x1234").validate().expect_err("bad");
        assert!(err.is(Err::InvalidConfig));
    }

    #[test]
    fn shared_networks() {
        let networks = Networks::new();
        let shared = networks.clone();

        networks
            .insert("0x539", NetworkConfig::new("http://localhost:8545", REGISTRY))
            .expect("should insert");
        assert!(shared.contains("0x539"));
        assert_eq!(shared.ids(), vec![1337]);

        let err = networks
            .insert("private", NetworkConfig::new("http://localhost:8545", REGISTRY))
            .expect_err("should fail");
        assert_eq!(err.to_string(), "Unknown network: 'private'");
    }

    #[test]
    fn chain_id_aliases() {
        let networks = Networks::new();
        networks
            .insert("1337", NetworkConfig::new("http://localhost:8545", REGISTRY))
            .expect("should insert");
        assert!(networks.contains("0x539"));
        assert_eq!(
            networks.get("0x539").map(|config| config.registry_address),
            Some(REGISTRY.to_string())
        );
        assert!(!networks.contains("private"));

        // hex and decimal forms name the same network
        networks
            .insert("0x539", NetworkConfig::new("http://127.0.0.1:7545", REGISTRY))
            .expect("should replace");
        assert_eq!(networks.ids(), vec![1337]);
        assert_eq!(
            networks.get("1337").map(|config| config.rpc_url),
            Some("http://127.0.0.1:7545".to_string())
        );
    }
}

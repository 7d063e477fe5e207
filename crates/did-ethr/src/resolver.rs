use async_trait::async_trait;
use did_core::document::{Relationship, DID_CONTEXT};
use did_core::error::Err;
use did_core::{tracerr, DidDocument, Resolver, Result, VerificationMethod};

use crate::network::{chain_id, is_well_known, Networks, DEFAULT_NETWORK};

const RECOVERY_CONTEXT: &str = "https://w3id.org/security/suites/secp256k1recovery-2020/v2";

/// Resolver for the `did:ethr` method.
///
/// DIDs take the form `did:ethr:[network:]identifier` where the identifier is either a
/// chain address or a compressed public key. The network must be a well-known name or
/// one of the configured networks.
#[derive(Clone, Debug, Default)]
pub struct EthrResolver {
    networks: Networks,
}

impl EthrResolver {
    /// Create a resolver over the shared network configuration.
    #[must_use]
    pub const fn new(networks: Networks) -> Self {
        Self { networks }
    }
}

#[async_trait]
impl Resolver for EthrResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument> {
        let Some(specific) = did.strip_prefix("did:ethr:") else {
            tracerr!(Err::InvalidFormat, "Not a did:ethr DID: {did}");
        };
        let (network, identifier) =
            specific.rsplit_once(':').unwrap_or((DEFAULT_NETWORK, specific));

        if !is_well_known(network) && !self.networks.contains(network) {
            tracerr!(Err::NotFound, "Unknown network: '{network}' for {did}");
        }
        let chain = chain_id(network)?;

        let mut doc = DidDocument {
            context: vec![DID_CONTEXT.to_string(), RECOVERY_CONTEXT.to_string()],
            id: did.to_string(),
            ..DidDocument::default()
        };

        let address = match identifier.len() {
            42 if keyring::is_eth_address(identifier) => identifier.to_lowercase(),
            68 => {
                let Ok(public_key) = hex::decode(identifier.trim_start_matches("0x")) else {
                    tracerr!(Err::InvalidFormat, "Invalid public key in {did}");
                };
                let address = keyring::to_ethereum_address(&public_key)?;
                let key_id = format!("{did}#controllerKey");
                doc.verification_method.push(VerificationMethod {
                    id: key_id.clone(),
                    type_: "EcdsaSecp256k1VerificationKey2019".to_string(),
                    controller: did.to_string(),
                    public_key_hex: Some(identifier.trim_start_matches("0x").to_string()),
                    ..VerificationMethod::default()
                });
                doc.authentication.push(Relationship::Reference(key_id.clone()));
                doc.assertion_method.push(Relationship::Reference(key_id));
                address
            }
            _ => tracerr!(Err::InvalidFormat, "Not a valid ethr DID: {did}"),
        };

        let controller_id = format!("{did}#controller");
        doc.verification_method.insert(
            0,
            VerificationMethod {
                id: controller_id.clone(),
                type_: "EcdsaSecp256k1RecoveryMethod2020".to_string(),
                controller: did.to_string(),
                blockchain_account_id: Some(format!("eip155:{chain}:{address}")),
                ..VerificationMethod::default()
            },
        );
        doc.authentication.insert(0, Relationship::Reference(controller_id.clone()));
        doc.assertion_method.insert(0, Relationship::Reference(controller_id));

        tracing::debug!(did, chain, "resolved default did:ethr document");
        Ok(doc)
    }
}

//! # DID Document
//!
//! A minimal rendering of a [DID document](https://www.w3.org/TR/did-core/#did-documents)
//! covering the properties needed to verify signed tokens: verification methods, the
//! `authentication` relationship and services.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Jwk;

/// Base context for DID documents.
pub const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

/// DID document.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct DidDocument {
    /// JSON-LD context(s).
    #[serde(rename = "@context", skip_serializing_if = "Vec::is_empty")]
    #[serde(deserialize_with = "one_or_many")]
    pub context: Vec<String>,

    /// The DID subject.
    pub id: String,

    /// Verification methods (public keys) associated with the subject.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub verification_method: Vec<VerificationMethod>,

    /// Legacy name for `verificationMethod` still emitted by older resolvers.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub public_key: Vec<VerificationMethod>,

    /// Verification methods that may be used to authenticate as the subject, either by
    /// reference (a DID URL) or embedded.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<Relationship>,

    /// Verification methods that may be used to issue assertions.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assertion_method: Vec<Relationship>,

    /// Service endpoints.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<Value>,
}

/// Reference to, or embedded, verification method.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Relationship {
    /// DID URL of a verification method declared elsewhere in the document.
    Reference(String),

    /// Embedded verification method.
    Embedded(VerificationMethod),
}

/// A verification method: public key material, or a blockchain account that signatures
/// can be recovered to.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct VerificationMethod {
    /// DID URL identifying the method.
    pub id: String,

    /// Method type, e.g. `EcdsaSecp256k1RecoveryMethod2020`.
    #[serde(rename = "type")]
    pub type_: String,

    /// The DID of the controller of the method.
    pub controller: String,

    /// Hex encoded (SEC1) public key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_hex: Option<String>,

    /// Public key as a JWK.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<Jwk>,

    /// Legacy Ethereum address form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ethereum_address: Option<String>,

    /// CAIP-10 account id, e.g. `eip155:1:0xb9c5...`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockchain_account_id: Option<String>,
}

impl VerificationMethod {
    /// The blockchain address of the method, if it is address based. Both the CAIP-10
    /// (`eip155:1:0x..`) and legacy (`0x..@eip155:1`) account id forms are recognised.
    #[must_use]
    pub fn address(&self) -> Option<String> {
        if let Some(address) = &self.ethereum_address {
            return Some(address.to_lowercase());
        }
        let account = self.blockchain_account_id.as_deref()?;
        let address = match account.split_once('@') {
            Some((address, _)) => address,
            None => account.rsplit(':').next().unwrap_or(account),
        };
        Some(address.to_lowercase())
    }
}

impl DidDocument {
    /// All verification methods declared by the document, whichever property they were
    /// declared under.
    pub fn verification_methods(&self) -> impl Iterator<Item = &VerificationMethod> {
        self.verification_method.iter().chain(self.public_key.iter()).chain(
            self.authentication.iter().filter_map(|r| match r {
                Relationship::Embedded(vm) => Some(vm),
                Relationship::Reference(_) => None,
            }),
        )
    }

    /// Verification methods that may be used to authenticate as the DID subject.
    #[must_use]
    pub fn authentication_methods(&self) -> Vec<&VerificationMethod> {
        self.authentication
            .iter()
            .filter_map(|r| match r {
                Relationship::Embedded(vm) => Some(vm),
                Relationship::Reference(id) => {
                    self.verification_methods().find(|vm| &vm.id == id)
                }
            })
            .collect()
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneMany {
        One(String),
        Many(Vec<Value>),
    }

    Ok(match OneMany::deserialize(deserializer)? {
        OneMany::One(s) => vec![s],
        // embedded context objects carry no information needed here
        OneMany::Many(values) => {
            values.into_iter().filter_map(|v| v.as_str().map(ToString::to_string)).collect()
        }
    })
}

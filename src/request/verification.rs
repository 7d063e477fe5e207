//! # Verification Requests
//!
//! Claim signature requests ask the counterparty to countersign an unsigned claim.
//! Verifications are signed attestations about a subject.

use did_core::Result;
use serde::Deserialize;
use serde_json::Value;

use crate::gateway::{Expiry, Gateway};
use crate::request::{self, types, Payload};

/// Claim signature request parameters.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerificationRequestParams {
    /// The claim to be signed.
    pub unsigned_claim: Value,

    /// DID of the subject of the claim.
    pub sub: Option<String>,

    /// DID of the party asked to sign the claim.
    pub aud: Option<String>,

    /// DID of the party requested to issue the claim, when not the audience.
    pub riss: Option<String>,

    /// Where the signed claim should be posted.
    pub callback_url: Option<String>,

    /// Credentials (tokens) about the requester.
    pub vc: Vec<String>,

    /// Expiry (seconds since epoch) of the countersigned claim. Independent of the
    /// request's own expiry.
    pub rexp: Option<i64>,

    /// Request expiry.
    #[serde(flatten, deserialize_with = "request::expiry_fields")]
    pub expiry: Option<Expiry>,
}

impl VerificationRequestParams {
    /// Read parameters from loosely typed JSON.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidRequest` - a field has the wrong shape.
    pub fn from_value(value: &Value) -> Result<Self> {
        request::from_value(value)
    }
}

/// Create a signed claim signature request.
///
/// # Errors
///
/// * `Err::InvalidConfig` - no signing identity is configured.
pub async fn create_request(
    gateway: &dyn Gateway, params: VerificationRequestParams,
) -> Result<String> {
    let mut payload = Payload::new(types::VERIFICATION_REQUEST);
    payload
        .set("unsignedClaim", params.unsigned_claim)
        .set_opt("sub", params.sub)
        .set_opt("aud", params.aud)
        .set_opt("riss", params.riss)
        .set_opt("callback", params.callback_url)
        .set_opt("rexp", params.rexp);
    if !params.vc.is_empty() {
        payload.set("vc", params.vc);
    }
    gateway.sign(payload.into_inner(), params.expiry).await
}

/// Attestation parameters.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Verification {
    /// DID of the subject.
    pub sub: String,

    /// The attested claim.
    pub claim: Value,

    /// Supporting credentials (tokens).
    pub vc: Vec<String>,

    /// Where the attestation should be delivered.
    pub callback_url: Option<String>,

    /// Attestation expiry.
    #[serde(flatten, deserialize_with = "request::expiry_fields")]
    pub expiry: Option<Expiry>,
}

/// Create a signed attestation.
///
/// # Errors
///
/// * `Err::InvalidConfig` - no signing identity is configured.
pub async fn create(gateway: &dyn Gateway, verification: Verification) -> Result<String> {
    let mut payload = serde_json::Map::new();
    payload.insert("sub".into(), verification.sub.into());
    payload.insert("claim".into(), verification.claim);
    if !verification.vc.is_empty() {
        payload.insert("vc".into(), verification.vc.into());
    }
    if let Some(callback) = verification.callback_url {
        payload.insert("callback".into(), callback.into());
    }
    gateway.sign(payload, verification.expiry).await
}

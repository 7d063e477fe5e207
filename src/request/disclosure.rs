//! # Disclosure Request
//!
//! Asks the counterparty to share profile claims and verifiable credentials, optionally
//! granting permission to send push notifications.

use did_core::error::Err;
use did_core::{tracerr, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::gateway::{Expiry, Gateway};
use crate::request::{self, types, AccountType, Claims, Payload, DEFAULT_EXPIRY};

/// Disclosure request parameters.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisclosureParams {
    /// Names of self-asserted claims to disclose.
    pub requested: Vec<String>,

    /// Names of claims to disclose with supporting credentials.
    pub verified: Vec<String>,

    /// Detailed claim specifications. Merged with `requested` and `verified`.
    pub claims: Option<Claims>,

    /// Ask for permission to send push notifications.
    pub notifications: bool,

    /// Where the response should be posted.
    pub callback_url: Option<String>,

    /// Network the counterparty's account should live on.
    pub network_id: Option<String>,

    /// RPC endpoint of a private network. Requires `network_id`.
    pub rpc_url: Option<String>,

    /// Kind of account to create or use.
    pub account_type: Option<AccountType>,

    /// Credentials (tokens) about the requester, shown to the counterparty.
    pub vc: Vec<String>,

    /// Public encryption key for encrypted responses.
    pub box_pub: Option<String>,

    /// Request expiry. Defaults to 10 minutes after issue.
    #[serde(flatten, deserialize_with = "request::expiry_fields")]
    pub expiry: Option<Expiry>,
}

impl DisclosureParams {
    /// Read parameters from loosely typed JSON.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidRequest` - a field has the wrong shape or an unsupported value.
    pub fn from_value(value: &Value) -> Result<Self> {
        request::from_value(value)
    }
}

/// Create a signed disclosure request.
///
/// # Errors
///
/// * `Err::InvalidRequest` - `rpc_url` was given without `network_id`.
/// * `Err::InvalidConfig` - no signing identity is configured.
pub async fn create(gateway: &dyn Gateway, params: DisclosureParams) -> Result<String> {
    let mut payload = Payload::new(types::DISCLOSURE_REQUEST);

    if let Some(rpc_url) = params.rpc_url {
        if params.network_id.is_none() {
            tracerr!(Err::InvalidRequest, "rpcUrl was specified but no networkId");
        }
        payload.set("rpc", rpc_url);
    }
    payload.set_opt("net", params.network_id);
    payload.set_opt("act", params.account_type.map(|a| a.to_string()));
    payload.set_opt("callback", params.callback_url);
    payload.set_opt("boxPub", params.box_pub);
    if params.notifications {
        payload.set("permissions", vec!["notifications"]);
    }
    if !params.requested.is_empty() {
        payload.set("requested", params.requested.clone());
    }
    if !params.verified.is_empty() {
        payload.set("verified", params.verified.clone());
    }

    let claims = params.claims.unwrap_or_default().merge(&params.requested, &params.verified);
    if !claims.is_empty() {
        payload.set_serialized("claims", &claims)?;
    }
    if !params.vc.is_empty() {
        payload.set("vc", params.vc);
    }

    let expiry = params.expiry.unwrap_or(Expiry::In(DEFAULT_EXPIRY));
    tracing::debug!(?expiry, "creating disclosure request");
    gateway.sign(payload.into_inner(), Some(expiry)).await
}

//! # Typed Data Signature Request
//!
//! Asks the counterparty to sign EIP712 structured data.

use did_core::error::Err;
use did_core::{tracerr, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::gateway::{Expiry, Gateway};
use crate::request::{self, types, Payload};

/// Members a typed data object must carry.
const REQUIRED: [&str; 4] = ["types", "primaryType", "domain", "message"];

/// Typed data signature request parameters.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypedDataParams {
    /// The EIP712 object: `types`, `primaryType`, `domain` and `message`.
    pub typed_data: Map<String, Value>,

    /// Address expected to sign.
    pub from: Option<String>,

    /// Network id.
    pub net: Option<String>,

    /// Where the signature should be posted.
    pub callback_url: Option<String>,

    /// Request expiry.
    #[serde(flatten, deserialize_with = "request::expiry_fields")]
    pub expiry: Option<Expiry>,
}

impl TypedDataParams {
    /// Read parameters from loosely typed JSON.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidRequest` - a field has the wrong shape.
    pub fn from_value(value: &Value) -> Result<Self> {
        request::from_value(value)
    }
}

/// Create a signed typed data signature request.
///
/// # Errors
///
/// * `Err::InvalidRequest` - the typed data is missing a required member.
/// * `Err::InvalidConfig` - no signing identity is configured.
pub async fn create(gateway: &dyn Gateway, params: TypedDataParams) -> Result<String> {
    if let Some(missing) = REQUIRED.iter().find(|k| !params.typed_data.contains_key(**k)) {
        tracerr!(Err::InvalidRequest, "Invalid EIP712 Request, must include '{missing}'");
    }

    let mut payload = Payload::new(types::TYPED_DATA_REQUEST);
    payload
        .set("typedData", params.typed_data)
        .set_opt("from", params.from)
        .set_opt("net", params.net)
        .set_opt("callback", params.callback_url);
    gateway.sign(payload.into_inner(), params.expiry).await
}

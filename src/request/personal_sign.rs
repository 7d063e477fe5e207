//! # Personal Signature Request

use did_core::error::Err;
use did_core::{tracerr, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::gateway::{Expiry, Gateway};
use crate::request::{self, types, Payload};

/// Personal signature request parameters.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalSignParams {
    /// Hex encoded data to sign.
    pub data: String,

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

impl PersonalSignParams {
    /// Read parameters from loosely typed JSON.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidRequest` - a field has the wrong shape.
    pub fn from_value(value: &Value) -> Result<Self> {
        request::from_value(value)
    }
}

/// Create a signed personal signature request.
///
/// # Errors
///
/// * `Err::InvalidRequest` - `data` is missing.
/// * `Err::InvalidConfig` - no signing identity is configured.
pub async fn create(gateway: &dyn Gateway, params: PersonalSignParams) -> Result<String> {
    if params.data.is_empty() {
        tracerr!(Err::InvalidRequest, "Personal sign request must include 'data'");
    }

    let mut payload = Payload::new(types::PERSONAL_SIGN_REQUEST);
    payload
        .set("data", params.data)
        .set_opt("from", params.from)
        .set_opt("net", params.net)
        .set_opt("callback", params.callback_url);
    gateway.sign(payload.into_inner(), params.expiry).await
}

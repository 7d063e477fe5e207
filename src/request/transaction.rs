//! # Transaction Request
//!
//! Asks the counterparty to sign and send a transaction, usually a contract function call
//! built with [`crate::contract`].

use did_core::error::Err;
use did_core::{tracerr, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gateway::{Expiry, Gateway};
use crate::request::{self, types, Payload, DEFAULT_EXPIRY};

/// A transaction to be signed by the counterparty.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct TxParams {
    /// Recipient (contract) address.
    pub to: String,

    /// Function call description, e.g. `transfer(address "0x..", uint256 5)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,

    /// Value to transfer, in wei.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Gas limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,

    /// Gas price, in wei.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,

    /// Raw call data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Transaction request options.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TxRequestOptions {
    /// Where the transaction hash should be posted.
    pub callback_url: Option<String>,

    /// Network the transaction should be sent to.
    pub network_id: Option<String>,

    /// Label shown to the user.
    pub label: Option<String>,

    /// Request expiry. Defaults to 10 minutes after issue.
    #[serde(flatten, deserialize_with = "request::expiry_fields")]
    pub expiry: Option<Expiry>,
}

impl TxRequestOptions {
    /// Read options from loosely typed JSON.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidRequest` - a field has the wrong shape.
    pub fn from_value(value: &Value) -> Result<Self> {
        request::from_value(value)
    }
}

/// Create a signed transaction request.
///
/// # Errors
///
/// * `Err::InvalidRequest` - the transaction has no recipient.
/// * `Err::InvalidConfig` - no signing identity is configured.
pub async fn create(
    gateway: &dyn Gateway, tx: TxParams, options: TxRequestOptions,
) -> Result<String> {
    if tx.to.is_empty() {
        tracerr!(Err::InvalidRequest, "Transaction request must include 'to'");
    }

    let Value::Object(fields) = serde_json::to_value(&tx)? else {
        tracerr!(Err::SerializationError, "Transaction is not an object");
    };
    let mut payload = Payload::new(types::TRANSACTION_REQUEST);
    for (key, value) in fields {
        payload.set(&key, value);
    }
    payload
        .set_opt("callback", options.callback_url)
        .set_opt("net", options.network_id)
        .set_opt("label", options.label);

    let expiry = options.expiry.unwrap_or(Expiry::In(DEFAULT_EXPIRY));
    gateway.sign(payload.into_inner(), Some(expiry)).await
}

//! # Disclosure Responses
//!
//! Creating a response to a disclosure request, and verifying a response against the
//! request (challenge) that prompted it.
//!
//! Verification runs in order: the response token itself, the embedded challenge, then
//! the disclosed profile and its credentials. The first failure is terminal, except for
//! credentials, which are partitioned into `verified` and `invalid`.

use did_core::error::Err;
use did_core::{tracerr, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::aggregate::aggregate;
use crate::core::OneMany;
use crate::gateway::{Expiry, Gateway, Verified, VerifyOptions};
use crate::jose;
use crate::request::{self, types, Payload, DEFAULT_EXPIRY};

/// Capability `type` marking a push notification token.
pub const PUSH_CAPABILITY: &str = "notifications";

/// What a response must satisfy.
#[derive(Clone, Debug, Default)]
pub struct Expectations {
    /// Callback URL the response may be addressed to.
    pub callback_url: Option<String>,

    /// Fail if the response does not embed the original request.
    pub require_challenge: bool,

    /// Only accept response keys listed for authentication.
    pub auth: bool,
}

/// A disclosed, verified profile.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// DID of the responding party.
    pub did: String,

    /// Self-asserted claims.
    #[serde(flatten)]
    pub own: Map<String, Value>,

    /// Credentials that verified.
    pub verified: Vec<Verified>,

    /// Credential tokens that failed verification.
    pub invalid: Vec<String>,

    /// Token granting permission to send push notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,

    /// Public encryption key of the responding party.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_pub: Option<String>,

    /// Device key of the responding party.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_key: Option<String>,

    /// Network address (MNID) of the responding party's account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nad: Option<String>,
}

impl Profile {
    /// Self-asserted claim value.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.own.get(name)
    }
}

/// Verify a disclosure response.
///
/// # Errors
///
/// * Any error verifying the response token itself.
/// * `Err::InvalidChallenge` - the challenge is missing (when required), was not a
///   disclosure request, or was not issued by this identity.
/// * `Err::InvalidAudience` - the challenge was addressed to a different DID.
pub async fn verify(
    gateway: &dyn Gateway, token: &str, expectations: &Expectations,
) -> Result<Profile> {
    let options = VerifyOptions {
        audience: None,
        callback_url: expectations.callback_url.clone(),
        auth: expectations.auth,
    };
    let response = gateway.verify(token, &options).await?;
    let payload = &response.payload;

    match payload.get("req").and_then(Value::as_str) {
        Some(req) => check_challenge(gateway, req).await?,
        None if expectations.require_challenge => {
            tracerr!(Err::InvalidChallenge, "Challenge was not included in response");
        }
        None => {}
    }

    let own = match payload.get("own") {
        Some(Value::Object(own)) => own.clone(),
        _ => Map::new(),
    };
    let tokens = strings(payload.get("verified"));
    let credentials = aggregate(gateway, &tokens).await;
    let push_token = strings(payload.get("capabilities")).into_iter().find(|c| is_push_token(c));
    let text = |key: &str| payload.get(key).and_then(Value::as_str).map(ToString::to_string);

    tracing::debug!(
        did = %response.issuer,
        invalid = credentials.invalid.len(),
        "verified disclosure"
    );
    Ok(Profile {
        did: response.issuer.clone(),
        own,
        verified: credentials.verified,
        invalid: credentials.invalid,
        push_token,
        box_pub: text("boxPub"),
        device_key: text("dad"),
        nad: text("nad"),
    })
}

// Correlate the embedded request with this identity.
async fn check_challenge(gateway: &dyn Gateway, req: &str) -> Result<()> {
    let Some(did) = gateway.issuer() else {
        tracerr!(Err::InvalidConfig, "Unable to verify challenge: no DID configured");
    };

    let unverified = jose::decode(req)?;
    if let Some(aud) = unverified.payload.get("aud") {
        let aud: OneMany<String> = serde_json::from_value(aud.clone())?;
        if !aud.contains(&did.to_string()) {
            let aud = aud.iter().cloned().collect::<Vec<_>>().join(",");
            tracerr!(
                Err::InvalidAudience,
                "JWT audience does not match your DID: aud: {aud} !== yours: {did}"
            );
        }
    }

    let challenge = gateway.verify(req, &VerifyOptions::default()).await?;
    let type_ = challenge.payload.get("type").and_then(Value::as_str).unwrap_or_default();
    if type_ != types::DISCLOSURE_REQUEST {
        tracerr!(Err::InvalidChallenge, "Challenge payload type invalid: {type_}");
    }
    if challenge.issuer != did {
        tracerr!(
            Err::InvalidChallenge,
            "Challenge issuer does not match your DID: iss: {} !== yours: {did}",
            challenge.issuer
        );
    }
    Ok(())
}

fn is_push_token(token: &str) -> bool {
    jose::decode(token).is_ok_and(|jwt| jwt.claim("type") == Some(PUSH_CAPABILITY))
}

fn strings(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => {
            items.iter().filter_map(Value::as_str).map(ToString::to_string).collect()
        }
        Some(Value::String(item)) => vec![item.clone()],
        _ => Vec::new(),
    }
}

/// A disclosure response, created by the party answering a disclosure request.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisclosureResponse {
    /// The disclosure request (challenge) being answered.
    pub req: Option<String>,

    /// Self-asserted claims.
    pub own: Map<String, Value>,

    /// Credential tokens.
    pub verified: Vec<String>,

    /// Capability tokens, such as a push notification token.
    pub capabilities: Vec<String>,

    /// Network address (MNID) of the responder's account.
    pub nad: Option<String>,

    /// Device key.
    pub dad: Option<String>,

    /// Public encryption key.
    pub box_pub: Option<String>,

    /// Response expiry. Defaults to 10 minutes after issue.
    #[serde(flatten, deserialize_with = "request::expiry_fields")]
    pub expiry: Option<Expiry>,
}

impl DisclosureResponse {
    /// Read a response from loosely typed JSON.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidRequest` - a field has the wrong shape.
    pub fn from_value(value: &Value) -> Result<Self> {
        request::from_value(value)
    }
}

/// Create a signed disclosure response. When answering a request, the request is verified
/// and the response is addressed to its issuer.
///
/// # Errors
///
/// * Any error verifying the request.
/// * `Err::InvalidConfig` - no signing identity is configured.
pub async fn create(gateway: &dyn Gateway, response: DisclosureResponse) -> Result<String> {
    let mut payload = Payload::new(types::DISCLOSURE_RESPONSE);

    if let Some(req) = response.req {
        let request = gateway.verify(&req, &VerifyOptions::default()).await?;
        payload.set("aud", request.issuer).set("req", req);
    }
    if !response.own.is_empty() {
        payload.set("own", response.own);
    }
    if !response.verified.is_empty() {
        payload.set("verified", response.verified);
    }
    if !response.capabilities.is_empty() {
        payload.set("capabilities", response.capabilities);
    }
    payload
        .set_opt("nad", response.nad)
        .set_opt("dad", response.dad)
        .set_opt("boxPub", response.box_pub);

    let expiry = response.expiry.unwrap_or(Expiry::In(DEFAULT_EXPIRY));
    gateway.sign(payload.into_inner(), Some(expiry)).await
}

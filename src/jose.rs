//! # JSON Object Signing and Encryption
//!
//! Compact JWS encoding of signed tokens. Only the `ES256K` and `ES256K-R` algorithms are
//! supported.

use base64ct::{Base64UrlUnpadded, Encoding};
use did_core::error::{Context, Err};
use did_core::{tracerr, Algorithm, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JWS header.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Header {
    /// Token type. Always `JWT` for tokens issued here.
    #[serde(default = "jwt_type")]
    pub typ: String,

    /// Signature algorithm.
    pub alg: Algorithm,
}

impl Header {
    /// Create a `JWT` header for the algorithm.
    #[must_use]
    pub fn new(alg: Algorithm) -> Self {
        Self { typ: jwt_type(), alg }
    }
}

fn jwt_type() -> String {
    "JWT".into()
}

/// A decoded, not necessarily verified, token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Jwt {
    /// Token header.
    pub header: Header,

    /// Token claims.
    pub payload: Map<String, Value>,

    /// The signed portion of the token: `header.payload`.
    pub signing_input: String,

    /// Raw signature bytes.
    pub signature: Vec<u8>,
}

impl Jwt {
    /// String claim from the payload.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&str> {
        self.payload.get(name).and_then(Value::as_str)
    }

    /// Numeric (seconds since epoch) claim from the payload.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn time_claim(&self, name: &str) -> Option<i64> {
        let value = self.payload.get(name)?;
        value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
    }
}

/// Build the signing input (`b64url(header).b64url(payload)`) for the claims.
///
/// # Errors
///
/// * `Err::SerializationError` - the header or claims cannot be serialized.
pub fn signing_input(header: &Header, claims: &Map<String, Value>) -> Result<String> {
    let header = serde_json::to_vec(header).context(Err::SerializationError)?;
    let claims = serde_json::to_vec(claims).context(Err::SerializationError)?;
    Ok(format!(
        "{}.{}",
        Base64UrlUnpadded::encode_string(&header),
        Base64UrlUnpadded::encode_string(&claims)
    ))
}

/// Append the signature to a signing input to form the compact token.
#[must_use]
pub fn compact(signing_input: &str, signature: &[u8]) -> String {
    format!("{signing_input}.{}", Base64UrlUnpadded::encode_string(signature))
}

/// Decode a compact token without verifying it.
///
/// # Errors
///
/// * `Err::InvalidFormat` - the token is not a three part compact JWS with JSON header
///   and payload.
pub fn decode(token: &str) -> Result<Jwt> {
    let parts: Vec<&str> = token.split('.').collect();
    let [encoded_header, encoded_payload, signature] = parts.as_slice() else {
        tracerr!(Err::InvalidFormat, "Incorrect format, invalid JWT: {} parts", parts.len());
    };

    let decoded = Base64UrlUnpadded::decode_vec(encoded_header).context(Err::InvalidFormat)?;
    let header: Header = match serde_json::from_slice(&decoded) {
        Ok(header) => header,
        Err(e) => tracerr!(Err::InvalidFormat, "Invalid JWT header: {e}"),
    };
    let decoded = Base64UrlUnpadded::decode_vec(encoded_payload).context(Err::InvalidFormat)?;
    let Ok(Value::Object(claims)) = serde_json::from_slice::<Value>(&decoded) else {
        tracerr!(Err::InvalidFormat, "Invalid JWT payload: not a JSON object");
    };
    let signature = Base64UrlUnpadded::decode_vec(signature).context(Err::InvalidFormat)?;

    Ok(Jwt {
        header,
        payload: claims,
        signing_input: format!("{encoded_header}.{encoded_payload}"),
        signature,
    })
}

//! # Requests
//!
//! Builders for the signed requests sent to a counterparty: disclosure requests, claim
//! (verification) signature requests, typed data and personal signature requests, and
//! transaction requests.
//!
//! Parameters are strongly typed. Each parameter struct can also be read from loosely
//! typed JSON with `from_value`, in which case unrecognised fields are dropped.

pub mod disclosure;
pub mod personal_sign;
pub mod transaction;
pub mod typed_data;
pub mod verification;

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use did_core::error::{Err, Error};
use did_core::{tracerr, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::gateway::Expiry;

/// Request (and response) type tags.
pub mod types {
    /// Selective disclosure request.
    pub const DISCLOSURE_REQUEST: &str = "shareReq";
    /// Selective disclosure response.
    pub const DISCLOSURE_RESPONSE: &str = "shareResp";
    /// Claim signature request.
    pub const VERIFICATION_REQUEST: &str = "verReq";
    /// EIP712 typed data signature request.
    pub const TYPED_DATA_REQUEST: &str = "typedDataSigReq";
    /// Personal signature request.
    pub const PERSONAL_SIGN_REQUEST: &str = "personalSigReq";
    /// Transaction request.
    pub const TRANSACTION_REQUEST: &str = "ethtx";
}

/// Default lifetime, in seconds, of disclosure and transaction requests.
pub const DEFAULT_EXPIRY: i64 = 600;

/// Kind of account the counterparty should create or use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountType {
    /// Account shared across applications.
    General,

    /// Account segregated to the requesting application.
    Segregated,

    /// Key pair account.
    Keypair,

    /// No account.
    None,
}

impl Display for AccountType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::General => "general",
            Self::Segregated => "segregated",
            Self::Keypair => "keypair",
            Self::None => "none",
        };
        write!(f, "{s}")
    }
}

impl FromStr for AccountType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "general" => Ok(Self::General),
            "segregated" => Ok(Self::Segregated),
            "keypair" => Ok(Self::Keypair),
            "none" => Ok(Self::None),
            _ => tracerr!(Err::InvalidRequest, "Unsupported accountType {s}"),
        }
    }
}

impl Serialize for AccountType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AccountType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// How a single claim is requested.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClaimSpec {
    /// The claim is required for the interaction to continue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub essential: Option<bool>,

    /// Reason shown to the user for requesting the claim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Issuers whose credentials for the claim are acceptable.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub iss: Vec<ClaimIssuer>,
}

/// An acceptable issuer of a verifiable claim.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClaimIssuer {
    /// Issuer DID.
    pub did: String,

    /// Where the user can obtain the credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Requested claims, normalized so every requested claim appears exactly once.
///
/// Claims without a specification are serialized as `null`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Claims {
    /// Self-asserted profile claims.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub user_info: BTreeMap<String, Option<ClaimSpec>>,

    /// Claims that must be backed by a verifiable credential.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub verifiable: BTreeMap<String, Option<ClaimSpec>>,
}

impl Claims {
    /// Merge plain lists of requested and verified claim names into the claims. Existing
    /// specifications are kept.
    #[must_use]
    pub fn merge(mut self, requested: &[String], verified: &[String]) -> Self {
        for name in requested {
            self.user_info.entry(name.clone()).or_default();
        }
        for name in verified {
            self.verifiable.entry(name.clone()).or_default();
        }
        self
    }

    /// Returns `true` if no claims are requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.user_info.is_empty() && self.verifiable.is_empty()
    }
}

/// Read `exp` (absolute) or `expiresIn` (relative) from loosely typed parameters. Setting
/// both is rejected.
pub(crate) fn expiry_fields<'de, D>(deserializer: D) -> Result<Option<Expiry>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Fields {
        exp: Option<i64>,
        expires_in: Option<i64>,
    }

    let fields = Fields::deserialize(deserializer)?;
    match (fields.exp, fields.expires_in) {
        (Some(_), Some(_)) => {
            Err(serde::de::Error::custom("Conflicting options: both exp and expiresIn are set"))
        }
        (Some(exp), None) => Ok(Some(Expiry::At(exp))),
        (None, Some(secs)) => Ok(Some(Expiry::In(secs))),
        (None, None) => Ok(None),
    }
}

/// Deserialize loosely typed parameters, mapping failures to `Err::InvalidRequest`.
pub(crate) fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T> {
    match serde_json::from_value(value.clone()) {
        Ok(params) => Ok(params),
        Err(e) => tracerr!(Err::InvalidRequest, "{e}"),
    }
}

/// Payload under construction. `None` values are skipped.
#[derive(Debug, Default)]
pub(crate) struct Payload(Map<String, Value>);

impl Payload {
    pub(crate) fn new(type_: &str) -> Self {
        let mut map = Map::new();
        map.insert("type".into(), type_.into());
        Self(map)
    }

    pub(crate) fn set(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub(crate) fn set_opt<V: Into<Value>>(&mut self, key: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.0.insert(key.into(), value.into());
        }
        self
    }

    pub(crate) fn set_serialized(
        &mut self, key: &str, value: &impl Serialize,
    ) -> Result<&mut Self> {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => tracerr!(Err::SerializationError, "Error serializing {key}: {e}"),
        };
        self.0.insert(key.into(), value);
        Ok(self)
    }

    pub(crate) fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

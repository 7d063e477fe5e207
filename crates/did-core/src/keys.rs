//! Signature algorithms and key representations.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Err, Error};
use crate::{tracerr, Result};

/// Simplified JSON Web Key (JWK) key structure.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Jwk {
    /// Key type.
    pub kty: String,
    /// Cryptographic curve type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    /// X coordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// Y coordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

impl Jwk {
    /// Check the key is a secp256k1 elliptic curve key with both coordinates present.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidKey` - The key structure cannot be interpreted as a secp256k1 key.
    pub fn check_secp256k1(&self) -> Result<()> {
        if self.kty != "EC" || self.crv.as_deref() != Some("secp256k1") {
            tracerr!(Err::InvalidKey, "Unknown key type and curve combination");
        }
        if self.x.as_deref().unwrap_or_default().is_empty() {
            tracerr!(Err::InvalidKey, "Missing x coordinate");
        }
        if self.y.as_deref().unwrap_or_default().is_empty() {
            tracerr!(Err::InvalidKey, "Missing y coordinate");
        }
        Ok(())
    }
}

/// Token signature algorithms supported by the workspace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// ECDSA using the secp256k1 curve and SHA-256. The signature is `r || s`.
    Es256k,

    /// ECDSA using the secp256k1 curve and SHA-256 with the recovery parameter appended
    /// (`r || s || v`) so the signing address can be recovered.
    #[default]
    Es256kR,
}

impl Algorithm {
    /// Length in bytes of a signature produced with this algorithm.
    #[must_use]
    pub const fn signature_len(self) -> usize {
        match self {
            Self::Es256k => 64,
            Self::Es256kR => 65,
        }
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Es256k => write!(f, "ES256K"),
            Self::Es256kR => write!(f, "ES256K-R"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ES256K" => Ok(Self::Es256k),
            "ES256K-R" => Ok(Self::Es256kR),
            _ => tracerr!(Err::UnsupportedAlgorithm, "Unsupported signing algorithm: {s}"),
        }
    }
}

impl Serialize for Algorithm {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Algorithm {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

//! # Signing and Verification Gateway
//!
//! Every token issued or checked by [`crate::Credentials`] passes through a [`Gateway`].
//! [`JwtGateway`] is the default implementation, signing with the identity's
//! [`Signer`](did_core::Signer) and resolving issuers with its
//! [`Resolver`](did_core::Resolver).

use std::sync::Arc;

use async_trait::async_trait;
use did_core::error::Err;
use did_core::{tracerr, Algorithm, DidDocument, Result, VerificationMethod};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::clock::Clock;
use crate::core::OneMany;
use crate::identity::Identity;
use crate::jose::{self, Header, Jwt};

/// Allowed clock difference, in seconds, between issuer and verifier.
pub const CLOCK_SKEW: i64 = 300;

/// Token expiry, either at a fixed time or relative to the time of issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expiry {
    /// Expire at the given time (seconds since the Unix epoch).
    At(i64),

    /// Expire the given number of seconds after issue.
    In(i64),
}

impl Expiry {
    /// The `exp` claim for a token issued at `iat`, or `None` if a relative expiry
    /// overflows.
    #[must_use]
    pub const fn at(self, iat: i64) -> Option<i64> {
        match self {
            Self::At(exp) => Some(exp),
            Self::In(secs) => iat.checked_add(secs),
        }
    }
}

/// Options for verifying a token.
#[derive(Clone, Debug, Default)]
pub struct VerifyOptions {
    /// Expected audience. Defaults to the identity's DID.
    pub audience: Option<String>,

    /// Callback URL the token may have been addressed to instead of the DID.
    pub callback_url: Option<String>,

    /// Only accept keys listed under the issuer's `authentication` relationship.
    pub auth: bool,
}

/// A successfully verified token.
#[derive(Clone, Debug, Serialize)]
pub struct Verified {
    /// Token claims.
    pub payload: Map<String, Value>,

    /// The DID that issued the token.
    pub issuer: String,

    /// The verification method whose key signed the token.
    pub signer: VerificationMethod,

    /// The issuer's DID document.
    pub document: DidDocument,

    /// The original token.
    pub jwt: String,
}

/// Signs and verifies tokens on behalf of an identity.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// The DID tokens are issued as, if any.
    fn issuer(&self) -> Option<&str>;

    /// Sign `claims`, adding `iss`, `iat` and (when `expiry` is set) `exp`.
    async fn sign(&self, claims: Map<String, Value>, expiry: Option<Expiry>) -> Result<String>;

    /// Verify the token's signature, validity period and audience.
    async fn verify(&self, token: &str, options: &VerifyOptions) -> Result<Verified>;
}

/// Default gateway signing compact JWS tokens with `ES256K` or `ES256K-R`.
#[derive(Clone)]
pub struct JwtGateway {
    identity: Identity,
    clock: Arc<dyn Clock>,
}

impl JwtGateway {
    /// Create a gateway for the identity.
    #[must_use]
    pub fn new(identity: Identity, clock: Arc<dyn Clock>) -> Self {
        Self { identity, clock }
    }

    fn check_times(&self, jwt: &Jwt) -> Result<()> {
        let now = self.clock.now();

        if let Some(nbf) = jwt.time_claim("nbf") {
            if nbf > now + CLOCK_SKEW {
                tracerr!(Err::NotYetValid, "JWT not valid before nbf: {nbf}");
            }
        } else if let Some(iat) = jwt.time_claim("iat") {
            if iat > now + CLOCK_SKEW {
                tracerr!(Err::NotYetValid, "JWT not valid yet (issued in the future) iat: {iat}");
            }
        }
        if let Some(exp) = jwt.time_claim("exp") {
            if exp <= now - CLOCK_SKEW {
                tracerr!(Err::Expired, "JWT has expired: exp: {exp} < now: {now}");
            }
        }
        Ok(())
    }

    fn check_audience(&self, jwt: &Jwt, options: &VerifyOptions) -> Result<()> {
        let Some(aud) = jwt.payload.get("aud") else {
            return Ok(());
        };
        let aud: OneMany<String> = match serde_json::from_value(aud.clone()) {
            Ok(aud) => aud,
            Err(e) => tracerr!(Err::InvalidAudience, "Invalid JWT audience: {e}"),
        };

        let audience = options.audience.as_deref().or_else(|| self.identity.did());
        if audience.is_none() && options.callback_url.is_none() {
            tracerr!(
                Err::InvalidAudience,
                "JWT audience is required but your app address has not been configured"
            );
        }
        let matches = |expected: Option<&str>| {
            expected.is_some_and(|expected| aud.iter().any(|a| a == expected))
        };
        if !matches(audience) && !matches(options.callback_url.as_deref()) {
            tracerr!(Err::InvalidAudience, "JWT audience does not match your DID or callback url");
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for JwtGateway {
    fn issuer(&self) -> Option<&str> {
        self.identity.did()
    }

    async fn sign(&self, mut claims: Map<String, Value>, expiry: Option<Expiry>) -> Result<String> {
        let (Some(signer), Some(did)) = (self.identity.signer(), self.identity.did()) else {
            tracerr!(Err::InvalidConfig, "No Signing Identity configured");
        };
        let alg = signer.algorithm(self.identity.algorithm())?;

        let iat = self.clock.now();
        claims.insert("iat".into(), iat.into());
        if let Some(expiry) = expiry {
            let exp = match (expiry, expiry.at(iat)) {
                (_, Some(exp)) => exp,
                (Expiry::In(secs) | Expiry::At(secs), None) => {
                    tracerr!(Err::InvalidRequest, "expiresIn out of range: {secs}")
                }
            };
            claims.insert("exp".into(), exp.into());
        }
        claims.insert("iss".into(), did.into());

        let input = jose::signing_input(&Header::new(alg), &claims)?;
        let signature = signer.try_sign(input.as_bytes(), alg).await?;
        if signature.len() != alg.signature_len() {
            tracerr!(
                Err::SigningError,
                "Signer returned {} bytes, expected {} for {alg}",
                signature.len(),
                alg.signature_len()
            );
        }

        tracing::debug!(iss = did, %alg, "signed token");
        Ok(jose::compact(&input, &signature))
    }

    async fn verify(&self, token: &str, options: &VerifyOptions) -> Result<Verified> {
        let jwt = jose::decode(token)?;
        let Some(iss) = jwt.claim("iss") else {
            tracerr!(Err::InvalidFormat, "JWT did not contain an iss");
        };
        let issuer = normalize_did(iss);

        let document = self.identity.resolver().resolve(&issuer).await?;
        let candidates: Vec<&VerificationMethod> = if options.auth {
            document.authentication_methods()
        } else {
            document.verification_methods().collect()
        };
        if candidates.is_empty() {
            let purpose = if options.auth { " for authentication" } else { "" };
            tracerr!(
                Err::KeyNotFound,
                "DID document for {issuer} does not have public keys{purpose}"
            );
        }

        let Some(signer) = signing_method(&jwt, &candidates)? else {
            tracerr!(Err::FailedSignatureVerification, "Signature invalid for JWT");
        };
        let signer = signer.clone();

        self.check_times(&jwt)?;
        self.check_audience(&jwt, options)?;

        Ok(Verified {
            payload: jwt.payload,
            issuer,
            signer,
            document,
            jwt: token.to_string(),
        })
    }
}

/// Bare legacy MNIDs are promoted to `did:uport` DIDs.
pub(crate) fn normalize_did(iss: &str) -> String {
    if !iss.starts_with("did:") && keyring::is_mnid(iss) {
        return format!("did:uport:{iss}");
    }
    iss.to_string()
}

// Find the verification method that signed the token.
fn signing_method<'a>(
    jwt: &Jwt, candidates: &[&'a VerificationMethod],
) -> Result<Option<&'a VerificationMethod>> {
    let alg = jwt.header.alg;
    if jwt.signature.len() != alg.signature_len() {
        tracerr!(
            Err::FailedSignatureVerification,
            "Wrong signature length for {alg}: {}",
            jwt.signature.len()
        );
    }
    let msg = jwt.signing_input.as_bytes();

    // addresses of the keys that could have produced the signature
    let recovered: Vec<String> = keyring::recover_public_keys(msg, &jwt.signature)
        .unwrap_or_default()
        .iter()
        .filter_map(|pk| keyring::to_ethereum_address(pk).ok())
        .collect();

    for &vm in candidates {
        if let Some(public_key) = public_key(vm)? {
            let signed = match alg {
                Algorithm::Es256k => {
                    keyring::verify_signature(&public_key, msg, &jwt.signature).is_ok()
                }
                Algorithm::Es256kR => keyring::to_ethereum_address(&public_key)
                    .is_ok_and(|address| recovered.contains(&address)),
            };
            if signed {
                return Ok(Some(vm));
            }
        } else if let Some(address) = vm.address() {
            if recovered.contains(&address) {
                return Ok(Some(vm));
            }
        }
    }
    Ok(None)
}

fn public_key(vm: &VerificationMethod) -> Result<Option<Vec<u8>>> {
    if let Some(hex_key) = &vm.public_key_hex {
        return Ok(Some(hex::decode(hex_key.trim_start_matches("0x"))?));
    }
    if let Some(jwk) = &vm.public_key_jwk {
        return Ok(Some(keyring::public_key_from_jwk(jwk)?));
    }
    Ok(None)
}

//! # Verifiable Credentials
//!
//! Issue and verify W3C verifiable credentials and presentations encoded as JWTs.
//!
//! The W3C properties map onto registered JWT claims when encoding:
//!
//! | W3C                    | JWT   |
//! |------------------------|-------|
//! | `issuer`               | `iss` |
//! | `issuanceDate`         | `nbf` |
//! | `expirationDate`       | `exp` |
//! | `id`                   | `jti` |
//! | `credentialSubject.id` | `sub` |
//! | `holder`               | `iss` |
//!
//! The remaining properties are carried in the `vc` (or `vp`) claim. Decoding reverses
//! the mapping.

use chrono::{DateTime, Utc};
use did_core::error::Err;
use did_core::{tracerr, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::aggregate::{aggregate, Partition};
use crate::core::OneMany;
use crate::gateway::{Expiry, Gateway, Verified, VerifyOptions};

/// Base context for credentials and presentations.
pub const BASE_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

/// Base credential type.
pub const CREDENTIAL_TYPE: &str = "VerifiableCredential";

/// Base presentation type.
pub const PRESENTATION_TYPE: &str = "VerifiablePresentation";

/// A W3C verifiable credential.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    /// JSON-LD contexts. The first must be [`BASE_CONTEXT`].
    #[serde(rename = "@context")]
    pub context: OneMany<String>,

    /// Credential identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Credential types. Must include [`CREDENTIAL_TYPE`].
    #[serde(rename = "type")]
    pub type_: OneMany<String>,

    /// Issuer DID. Set from the issuing identity when not provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// Time the credential becomes valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuance_date: Option<DateTime<Utc>>,

    /// Time the credential expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,

    /// Claims about the subject. `id` is the subject's DID.
    pub credential_subject: Map<String, Value>,

    /// Other properties, e.g. `credentialStatus` or `evidence`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for VerifiableCredential {
    fn default() -> Self {
        Self {
            context: OneMany::Many(vec![BASE_CONTEXT.into()]),
            id: None,
            type_: OneMany::Many(vec![CREDENTIAL_TYPE.into()]),
            issuer: None,
            issuance_date: None,
            expiration_date: None,
            credential_subject: Map::new(),
            extra: Map::new(),
        }
    }
}

impl VerifiableCredential {
    fn validate(&self) -> Result<()> {
        check_context(&self.context)?;
        if !self.type_.contains(&CREDENTIAL_TYPE.to_string()) {
            tracerr!(Err::InvalidInput, "type must include {CREDENTIAL_TYPE}");
        }
        if self.credential_subject.is_empty() {
            tracerr!(Err::InvalidInput, "credentialSubject must not be empty");
        }
        Ok(())
    }
}

/// A W3C verifiable presentation.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerifiablePresentation {
    /// JSON-LD contexts. The first must be [`BASE_CONTEXT`].
    #[serde(rename = "@context")]
    pub context: OneMany<String>,

    /// Presentation identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Presentation types. Must include [`PRESENTATION_TYPE`].
    #[serde(rename = "type")]
    pub type_: OneMany<String>,

    /// DID of the presenting party.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,

    /// Credential tokens.
    pub verifiable_credential: Vec<String>,
}

impl Default for VerifiablePresentation {
    fn default() -> Self {
        Self {
            context: OneMany::Many(vec![BASE_CONTEXT.into()]),
            id: None,
            type_: OneMany::Many(vec![PRESENTATION_TYPE.into()]),
            holder: None,
            verifiable_credential: Vec::new(),
        }
    }
}

/// Presentation options.
#[derive(Clone, Debug, Default)]
pub struct PresentationOptions {
    /// Intended verifier(s) of the presentation.
    pub audience: Option<OneMany<String>>,

    /// Verifier supplied nonce, bound into the token.
    pub nonce: Option<String>,

    /// Presentation expiry.
    pub expiry: Option<Expiry>,
}

/// A verified credential: the token and the credential it encodes.
#[derive(Clone, Debug, Serialize)]
pub struct VerifiedCredential {
    /// The verified token.
    #[serde(flatten)]
    pub verified: Verified,

    /// The decoded credential.
    pub credential: VerifiableCredential,
}

/// A verified presentation, with its credentials verified independently.
#[derive(Clone, Debug, Serialize)]
pub struct VerifiedPresentation {
    /// The verified token.
    #[serde(flatten)]
    pub verified: Verified,

    /// The decoded presentation.
    pub presentation: VerifiablePresentation,

    /// Presented credentials partitioned by verification outcome.
    pub credentials: Partition,
}

/// Issue a credential as a signed JWT.
///
/// # Errors
///
/// * `Err::InvalidConfig` - no signing identity is configured.
/// * `Err::InvalidInput` - the credential is malformed or names a different issuer.
pub async fn issue(gateway: &dyn Gateway, credential: VerifiableCredential) -> Result<String> {
    let Some(did) = gateway.issuer() else {
        tracerr!(Err::InvalidConfig, "No Signing Identity configured");
    };
    credential.validate()?;
    if let Some(issuer) = &credential.issuer {
        if issuer != did {
            tracerr!(Err::InvalidInput, "Credential issuer {issuer} does not match your DID {did}");
        }
    }

    let VerifiableCredential {
        context,
        id,
        type_,
        issuance_date,
        expiration_date,
        mut credential_subject,
        extra,
        ..
    } = credential;

    let mut vc = extra;
    let sub = credential_subject.remove("id");
    vc.insert("@context".into(), serde_json::to_value(context)?);
    vc.insert("type".into(), serde_json::to_value(type_)?);
    vc.insert("credentialSubject".into(), credential_subject.into());

    let mut claims = Map::new();
    claims.insert("vc".into(), vc.into());
    if let Some(sub) = sub {
        claims.insert("sub".into(), sub);
    }
    if let Some(id) = id {
        claims.insert("jti".into(), id.into());
    }
    if let Some(issued) = issuance_date {
        claims.insert("nbf".into(), issued.timestamp().into());
    }
    let expiry = expiration_date.map(|exp| Expiry::At(exp.timestamp()));

    gateway.sign(claims, expiry).await
}

/// Verify a credential JWT.
///
/// # Errors
///
/// * Any error verifying the token.
/// * `Err::InvalidFormat` - the token does not carry a well-formed `vc` claim.
pub async fn verify_credential(gateway: &dyn Gateway, token: &str) -> Result<VerifiedCredential> {
    let verified = gateway.verify(token, &VerifyOptions::default()).await?;
    let credential = decode_credential(&verified)?;
    Ok(VerifiedCredential { verified, credential })
}

fn decode_credential(verified: &Verified) -> Result<VerifiableCredential> {
    let payload = &verified.payload;
    let Some(Value::Object(vc)) = payload.get("vc") else {
        tracerr!(Err::InvalidFormat, "JWT is not a verifiable credential: missing vc claim");
    };

    let mut vc = vc.clone();
    if let Some(Value::Object(subject)) = vc.get_mut("credentialSubject") {
        if let Some(sub) = payload.get("sub") {
            subject.insert("id".into(), sub.clone());
        }
    }
    vc.insert("issuer".into(), verified.issuer.clone().into());
    if let Some(jti) = payload.get("jti") {
        vc.insert("id".into(), jti.clone());
    }
    if let Some(date) = timestamp(payload.get("nbf").or_else(|| payload.get("iat"))) {
        vc.insert("issuanceDate".into(), date);
    }
    if let Some(date) = timestamp(payload.get("exp")) {
        vc.insert("expirationDate".into(), date);
    }

    let credential: VerifiableCredential = match serde_json::from_value(vc.into()) {
        Ok(credential) => credential,
        Err(e) => tracerr!(Err::InvalidFormat, "Invalid verifiable credential: {e}"),
    };
    if let Err(e) = credential.validate() {
        tracerr!(Err::InvalidFormat, "Invalid verifiable credential: {e}");
    }
    Ok(credential)
}

/// Present credentials as a signed JWT, held by this identity.
///
/// # Errors
///
/// * `Err::InvalidConfig` - no signing identity is configured.
/// * `Err::InvalidInput` - no credentials were supplied.
pub async fn create_presentation(
    gateway: &dyn Gateway, credentials: Vec<String>, options: PresentationOptions,
) -> Result<String> {
    if gateway.issuer().is_none() {
        tracerr!(Err::InvalidConfig, "No Signing Identity configured");
    }
    if credentials.is_empty() {
        tracerr!(Err::InvalidInput, "verifiableCredential must not be empty");
    }

    let presentation = VerifiablePresentation {
        verifiable_credential: credentials,
        ..VerifiablePresentation::default()
    };
    let mut claims = Map::new();
    claims.insert("vp".into(), serde_json::to_value(presentation)?);
    if let Some(audience) = options.audience {
        claims.insert("aud".into(), serde_json::to_value(audience)?);
    }
    if let Some(nonce) = options.nonce {
        claims.insert("nonce".into(), nonce.into());
    }

    gateway.sign(claims, options.expiry).await
}

/// Verify a presentation JWT addressed to `audience` (defaults to this identity's DID),
/// then verify each presented credential independently.
///
/// # Errors
///
/// * Any error verifying the token.
/// * `Err::InvalidFormat` - the token does not carry a well-formed `vp` claim, or the
///   holder is not the issuer of the token.
pub async fn verify_presentation(
    gateway: &dyn Gateway, token: &str, audience: Option<&str>,
) -> Result<VerifiedPresentation> {
    let options = VerifyOptions {
        audience: audience.map(ToString::to_string),
        ..VerifyOptions::default()
    };
    let verified = gateway.verify(token, &options).await?;

    let Some(vp) = verified.payload.get("vp") else {
        tracerr!(Err::InvalidFormat, "JWT is not a verifiable presentation: missing vp claim");
    };
    let mut presentation: VerifiablePresentation = match serde_json::from_value(vp.clone()) {
        Ok(presentation) => presentation,
        Err(e) => tracerr!(Err::InvalidFormat, "Invalid verifiable presentation: {e}"),
    };
    check_context(&presentation.context)?;
    if !presentation.type_.contains(&PRESENTATION_TYPE.to_string()) {
        tracerr!(Err::InvalidFormat, "type must include {PRESENTATION_TYPE}");
    }
    match &presentation.holder {
        Some(holder) if holder != &verified.issuer => {
            tracerr!(Err::InvalidFormat, "Presentation holder {holder} is not the issuer");
        }
        _ => presentation.holder = Some(verified.issuer.clone()),
    }

    let credentials = aggregate(gateway, &presentation.verifiable_credential).await;
    Ok(VerifiedPresentation {
        verified,
        presentation,
        credentials,
    })
}

fn check_context(context: &OneMany<String>) -> Result<()> {
    if context.first().map(String::as_str) != Some(BASE_CONTEXT) {
        tracerr!(Err::InvalidInput, "@context must begin with {BASE_CONTEXT}");
    }
    Ok(())
}

fn timestamp(value: Option<&Value>) -> Option<Value> {
    let secs = value?.as_i64()?;
    let date = DateTime::from_timestamp(secs, 0)?;
    serde_json::to_value(date).ok()
}

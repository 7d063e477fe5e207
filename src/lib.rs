//! # Credentials
//!
//! DID based challenge/response disclosure and verifiable credentials.
//!
//! A [`Credentials`] instance acts for a single identity. It builds signed requests
//! (disclosure, claim signature, typed data, personal signature and transaction requests),
//! verifies the counterparty's responses against the original challenge, and issues and
//! verifies W3C verifiable credentials and presentations.
//!
//! ```rust,no_run
//! use vercre_credentials::{Config, Credentials, DisclosureParams};
//!
//! # async fn example() -> vercre_credentials::Result<()> {
//! let credentials = Credentials::new(Config::new().private_key(
//!     "74894f8853f90e6e3d6dfdd343eb0eb70cca06e552ed8af80adadcc573b35da3",
//! ))?;
//!
//! let request = credentials
//!     .create_disclosure_request(DisclosureParams {
//!         requested: vec!["name".into()],
//!         notifications: true,
//!         ..DisclosureParams::default()
//!     })
//!     .await?;
//!
//! // ... send `request`, receive `response` ...
//! # let response = String::new();
//! let profile = credentials.authenticate_disclosure_response(&response, None).await?;
//! println!("{}", profile.did);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod clock;
pub mod config;
pub mod contract;
pub mod core;
pub mod gateway;
pub mod identity;
pub mod jose;
pub mod request;
pub mod response;
pub mod vc;

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

pub use did_core::error::{Err, Error};
pub use did_core::{Algorithm, DidDocument, Resolver, Result, Signer, VerificationMethod};
use serde_json::{Map, Value};

pub use self::aggregate::Partition;
use self::clock::{Clock, SystemClock};
pub use self::config::{Config, NetworkConfig};
pub use self::contract::Contract;
pub use self::gateway::{Expiry, Gateway, JwtGateway, Verified, VerifyOptions};
pub use self::identity::{Identity, NewIdentity};
pub use self::request::disclosure::DisclosureParams;
pub use self::request::personal_sign::PersonalSignParams;
pub use self::request::transaction::{TxParams, TxRequestOptions};
pub use self::request::typed_data::TypedDataParams;
pub use self::request::verification::{Verification, VerificationRequestParams};
pub use self::request::{AccountType, ClaimSpec, Claims};
pub use self::response::{DisclosureResponse, Expectations, Profile};
pub use self::vc::{
    PresentationOptions, VerifiableCredential, VerifiablePresentation, VerifiedCredential,
    VerifiedPresentation,
};

/// Issues requests and verifies responses on behalf of one identity.
#[derive(Clone)]
pub struct Credentials {
    identity: Identity,
    gateway: Arc<dyn Gateway>,
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("identity", &self.identity).finish_non_exhaustive()
    }
}

impl Credentials {
    /// Create an instance from configuration.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - the configuration is malformed or contradictory.
    pub fn new(config: Config) -> Result<Self> {
        let identity = identity::resolve(config)?;
        let gateway = Arc::new(JwtGateway::new(identity.clone(), Arc::new(SystemClock)));
        Ok(Self { identity, gateway })
    }

    /// Use `clock` for issuing and checking token times.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.gateway = Arc::new(JwtGateway::new(self.identity.clone(), Arc::new(clock)));
        self
    }

    /// Sign and verify through `gateway` instead of the default JWT gateway.
    #[must_use]
    pub fn with_gateway(mut self, gateway: impl Gateway + 'static) -> Self {
        self.gateway = Arc::new(gateway);
        self
    }

    /// Create a new key pair and the `did:ethr` DID it controls.
    #[must_use]
    pub fn create_identity() -> NewIdentity {
        identity::create_identity()
    }

    /// The identity's DID, if configured.
    #[must_use]
    pub fn did(&self) -> Option<&str> {
        self.identity.did()
    }

    /// The resolved identity.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Add (or replace) a network used to resolve `did:ethr` DIDs.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - the network configuration is malformed.
    pub fn add_network(&self, id: &str, network: NetworkConfig) -> Result<()> {
        self.identity.networks().insert(id, network)
    }

    /// Sign an arbitrary payload.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - no signing identity is configured.
    pub async fn sign_jwt(
        &self, payload: Map<String, Value>, expiry: Option<Expiry>,
    ) -> Result<String> {
        self.gateway.sign(payload, expiry).await
    }

    /// Verify an arbitrary token.
    ///
    /// # Errors
    ///
    /// * Any signature, time or audience verification failure.
    pub async fn verify_jwt(&self, token: &str, options: &VerifyOptions) -> Result<Verified> {
        self.gateway.verify(token, options).await
    }

    /// Create a signed selective disclosure request.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidRequest` - the parameters are invalid.
    /// * `Err::InvalidConfig` - no signing identity is configured.
    pub async fn create_disclosure_request(&self, params: DisclosureParams) -> Result<String> {
        request::disclosure::create(self.gateway.as_ref(), params).await
    }

    /// Create a signed request for the counterparty to sign a claim.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - no signing identity is configured.
    pub async fn create_verification_signature_request(
        &self, params: VerificationRequestParams,
    ) -> Result<String> {
        request::verification::create_request(self.gateway.as_ref(), params).await
    }

    /// Create a signed request for the counterparty to sign EIP712 typed data.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidRequest` - the typed data is incomplete.
    /// * `Err::InvalidConfig` - no signing identity is configured.
    pub async fn create_typed_data_signature_request(
        &self, params: TypedDataParams,
    ) -> Result<String> {
        request::typed_data::create(self.gateway.as_ref(), params).await
    }

    /// Create a signed request for the counterparty to sign arbitrary data.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - no signing identity is configured.
    pub async fn create_personal_sign_request(&self, params: PersonalSignParams) -> Result<String> {
        request::personal_sign::create(self.gateway.as_ref(), params).await
    }

    /// Create a signed transaction request.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidRequest` - the transaction has no recipient.
    /// * `Err::InvalidConfig` - no signing identity is configured.
    pub async fn create_tx_request(
        &self, tx: TxParams, options: TxRequestOptions,
    ) -> Result<String> {
        request::transaction::create(self.gateway.as_ref(), tx, options).await
    }

    /// Create a signed attestation about a subject.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - no signing identity is configured.
    pub async fn create_verification(&self, verification: Verification) -> Result<String> {
        request::verification::create(self.gateway.as_ref(), verification).await
    }

    /// Answer a disclosure request.
    ///
    /// # Errors
    ///
    /// * Any error verifying the embedded request.
    /// * `Err::InvalidConfig` - no signing identity is configured.
    pub async fn create_disclosure_response(&self, response: DisclosureResponse) -> Result<String> {
        response::create(self.gateway.as_ref(), response).await
    }

    /// Verify a disclosure response against the expectations.
    ///
    /// # Errors
    ///
    /// * Any error verifying the response or its challenge.
    pub async fn verify(&self, token: &str, expectations: &Expectations) -> Result<Profile> {
        response::verify(self.gateway.as_ref(), token, expectations).await
    }

    /// Authenticate a disclosure response: the response must answer a request issued by
    /// this identity and be signed with an authentication key.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidChallenge` - the challenge is missing or does not correlate.
    /// * Any other error verifying the response.
    pub async fn authenticate_disclosure_response(
        &self, token: &str, callback_url: Option<&str>,
    ) -> Result<Profile> {
        let expectations = Expectations {
            callback_url: callback_url.map(ToString::to_string),
            require_challenge: true,
            auth: true,
        };
        self.verify(token, &expectations).await
    }

    /// Verify a disclosure, with or without a challenge.
    ///
    /// # Errors
    ///
    /// * Any error verifying the response or a challenge it carries.
    pub async fn verify_disclosure(&self, token: &str) -> Result<Profile> {
        self.verify(token, &Expectations::default()).await
    }

    /// Verify credential tokens independently.
    pub async fn aggregate(&self, tokens: &[String]) -> Partition {
        aggregate::aggregate(self.gateway.as_ref(), tokens).await
    }

    /// Issue a verifiable credential.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - no signing identity is configured.
    /// * `Err::InvalidInput` - the credential is malformed.
    pub async fn issue_verifiable_credential(
        &self, credential: VerifiableCredential,
    ) -> Result<String> {
        vc::issue(self.gateway.as_ref(), credential).await
    }

    /// Present credentials.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - no signing identity is configured.
    /// * `Err::InvalidInput` - no credentials were supplied.
    pub async fn create_verifiable_presentation(
        &self, credentials: Vec<String>, options: PresentationOptions,
    ) -> Result<String> {
        vc::create_presentation(self.gateway.as_ref(), credentials, options).await
    }

    /// Verify a credential token.
    ///
    /// # Errors
    ///
    /// * Any error verifying the token or decoding the credential.
    pub async fn verify_credential(&self, token: &str) -> Result<VerifiedCredential> {
        vc::verify_credential(self.gateway.as_ref(), token).await
    }

    /// Verify a presentation token addressed to `audience` (defaults to this identity).
    ///
    /// # Errors
    ///
    /// * Any error verifying the token or decoding the presentation.
    pub async fn verify_presentation(
        &self, token: &str, audience: Option<&str>,
    ) -> Result<VerifiedPresentation> {
        vc::verify_presentation(self.gateway.as_ref(), token, audience).await
    }

    /// Describe calls to a contract for transaction requests.
    #[must_use]
    pub const fn contract(abi: Vec<contract::AbiItem>) -> Contract {
        Contract::new(abi)
    }
}

use async_trait::async_trait;
use did_core::error::{Context, Err};
use did_core::{tracerr, DidDocument, Resolver, Result};
use url::Url;

/// Resolver for the `did:web` method, fetching the DID document over HTTPS.
#[derive(Clone, Debug, Default)]
pub struct WebResolver {
    client: reqwest::Client,
}

impl WebResolver {
    /// Create a resolver using the supplied HTTP client. Timeouts and proxies are
    /// configured on the client.
    #[must_use]
    pub const fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Map a DID to the URL of its DID document.
///
/// The DID must be of the form `did:web:domain[%3Aport][:path]`. Port is optional and must
/// be preceded by a url-encoded colon. Sub-paths are separated by colons. Without a path,
/// the document is expected at `https://domain/.well-known/did.json`.
///
/// # Errors
///
/// * `Err::InvalidFormat` - the DID is not a `did:web` DID or does not map to a URL.
pub fn document_url(did: &str) -> Result<Url> {
    let Some(specific) = did.strip_prefix("did:web:") else {
        tracerr!(Err::InvalidFormat, "Not a did:web DID: {did}");
    };
    if specific.is_empty() {
        tracerr!(Err::InvalidFormat, "Not a did:web DID: {did}");
    }

    let mut path = "https://".to_owned() + &specific.replace(':', "/").replace("%3A", ":");
    if specific.contains(':') {
        path += "/did.json";
    } else {
        path += "/.well-known/did.json";
    }
    Url::parse(&path).context(format!("Invalid did:web DID: {did}"))
}

#[async_trait]
impl Resolver for WebResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument> {
        let url = document_url(did)?;

        let res = match self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => tracerr!(Err::RequestError, "Error sending DID resolution request: {e}"),
        };
        if !res.status().is_success() {
            tracerr!(Err::NotFound, "DID document not found for {did}: {}", res.status());
        }

        let doc = match res.json::<DidDocument>().await {
            Ok(doc) => doc,
            Err(e) => tracerr!(Err::DeserializationError, "Invalid DID document for {did}: {e}"),
        };
        if doc.id != did {
            tracerr!(Err::NotFound, "DID document id {} does not match {did}", doc.id);
        }
        Ok(doc)
    }
}

//! Tests for the disclosure request/response exchange.

use serde_json::{json, Map, Value};
use vercre_credentials::clock::FixedClock;
use vercre_credentials::{
    Config, Credentials, DisclosureParams, DisclosureResponse, Err, Verification,
};

const NOW: i64 = 1_700_000_000;

fn party() -> Credentials {
    let identity = Credentials::create_identity();
    Credentials::new(Config::new().private_key(identity.private_key))
        .expect("should create")
        .with_clock(FixedClock(NOW))
}

fn did(credentials: &Credentials) -> String {
    credentials.did().expect("did").to_string()
}

fn claims(value: Value) -> Map<String, Value> {
    let Value::Object(map) = value else { panic!("expected object") };
    map
}

// The full exchange: request, response with credentials and capabilities, verified
// profile.
#[tokio::test]
async fn authenticate_response() {
    let app = party();
    let user = party();
    let issuer = party();

    let request = app
        .create_disclosure_request(DisclosureParams {
            requested: vec!["name".into()],
            verified: vec!["email".into()],
            notifications: true,
            callback_url: Some("https://app.example/callback".into()),
            ..DisclosureParams::default()
        })
        .await
        .expect("should create request");

    let credential = issuer
        .create_verification(Verification {
            sub: did(&user),
            claim: json!({"email": "alice@example.com"}),
            ..Verification::default()
        })
        .await
        .expect("should attest");
    let push_token = user
        .sign_jwt(claims(json!({"type": "notifications", "value": "arn:aws:sns:endpoint"})), None)
        .await
        .expect("should sign");

    let response = user
        .create_disclosure_response(DisclosureResponse {
            req: Some(request),
            own: claims(json!({"name": "Alice"})),
            verified: vec![credential.clone(), "not.a.credential".into()],
            capabilities: vec![push_token.clone()],
            nad: Some("2nQtiQG6Cgm1GYTBaaKAgr76uY7iSexUkqX".into()),
            box_pub: Some("Qgigj54O7CsQOhR5vLTfqSQyD3zmq/Gb8ukID7XvC3o=".into()),
            ..DisclosureResponse::default()
        })
        .await
        .expect("should create response");

    let profile = app
        .authenticate_disclosure_response(&response, None)
        .await
        .expect("should authenticate");

    assert_eq!(profile.did, did(&user));
    assert_eq!(profile.claim("name"), Some(&json!("Alice")));
    assert_eq!(profile.verified.len(), 1);
    assert_eq!(profile.verified[0].issuer, did(&issuer));
    assert_eq!(profile.verified[0].payload["claim"]["email"], "alice@example.com");
    assert_eq!(profile.invalid, vec!["not.a.credential".to_string()]);
    assert_eq!(profile.push_token, Some(push_token));
    assert_eq!(profile.nad.as_deref(), Some("2nQtiQG6Cgm1GYTBaaKAgr76uY7iSexUkqX"));
    assert!(profile.box_pub.is_some());
}

#[tokio::test]
async fn missing_challenge() {
    let app = party();
    let user = party();

    let response = user
        .create_disclosure_response(DisclosureResponse {
            own: claims(json!({"name": "Alice"})),
            ..DisclosureResponse::default()
        })
        .await
        .expect("should create response");

    let err = app
        .authenticate_disclosure_response(&response, None)
        .await
        .expect_err("should fail");
    assert!(err.is(Err::InvalidChallenge));
    assert_eq!(err.to_string(), "Challenge was not included in response");

    // a challenge is optional when only verifying a disclosure
    let profile = app.verify_disclosure(&response).await.expect("should verify");
    assert_eq!(profile.claim("name"), Some(&json!("Alice")));
    assert!(profile.push_token.is_none());
}

#[tokio::test]
async fn challenge_audience() {
    let app = party();
    let user = party();
    let other = party();

    let request = app
        .sign_jwt(claims(json!({"type": "shareReq", "aud": did(&other)})), None)
        .await
        .expect("should sign");
    let response = user
        .sign_jwt(claims(json!({"type": "shareResp", "req": request, "aud": did(&app)})), None)
        .await
        .expect("should sign");

    let err = app
        .authenticate_disclosure_response(&response, None)
        .await
        .expect_err("should fail");
    assert!(err.is(Err::InvalidAudience));
    assert_eq!(
        err.to_string(),
        format!(
            "JWT audience does not match your DID: aud: {} !== yours: {}",
            did(&other),
            did(&app)
        )
    );
}

#[tokio::test]
async fn challenge_type() {
    let app = party();
    let user = party();

    let request = app
        .sign_jwt(claims(json!({"type": "verReq", "unsignedClaim": {}})), None)
        .await
        .expect("should sign");
    let response = user
        .create_disclosure_response(DisclosureResponse {
            req: Some(request),
            ..DisclosureResponse::default()
        })
        .await
        .expect("should create response");

    let err = app
        .authenticate_disclosure_response(&response, None)
        .await
        .expect_err("should fail");
    assert_eq!(err.to_string(), "Challenge payload type invalid: verReq");
}

// A response to another party's request does not authenticate.
#[tokio::test]
async fn challenge_issuer() {
    let app = party();
    let user = party();
    let other = party();

    let request = other
        .create_disclosure_request(DisclosureParams::default())
        .await
        .expect("should create request");
    let response = user
        .sign_jwt(claims(json!({"type": "shareResp", "req": request, "aud": did(&app)})), None)
        .await
        .expect("should sign");

    let err = app
        .authenticate_disclosure_response(&response, None)
        .await
        .expect_err("should fail");
    assert!(err.is(Err::InvalidChallenge));
}

// Responses addressed to someone else fail token verification.
#[tokio::test]
async fn response_audience() {
    let app = party();
    let user = party();
    let other = party();

    let request = other
        .create_disclosure_request(DisclosureParams::default())
        .await
        .expect("should create request");
    let response = user
        .create_disclosure_response(DisclosureResponse {
            req: Some(request),
            ..DisclosureResponse::default()
        })
        .await
        .expect("should create response");

    let err = app.verify_disclosure(&response).await.expect_err("should fail");
    assert!(err.is(Err::InvalidAudience));
    other.verify_disclosure(&response).await.expect("should verify");
}

// Callback URLs are an acceptable audience when authenticating.
#[tokio::test]
async fn callback_audience() {
    let app = party();
    let user = party();

    let request = app
        .create_disclosure_request(DisclosureParams::default())
        .await
        .expect("should create request");
    let response = user
        .sign_jwt(
            claims(json!({
                "type": "shareResp",
                "req": request,
                "aud": "https://app.example/callback"
            })),
            None,
        )
        .await
        .expect("should sign");

    app.authenticate_disclosure_response(&response, None).await.expect_err("no callback");
    app.authenticate_disclosure_response(&response, Some("https://app.example/callback"))
        .await
        .expect("should authenticate");
}

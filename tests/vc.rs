//! Tests for issuing and verifying verifiable credentials and presentations.

use chrono::DateTime;
use serde_json::{json, Map, Value};
use vercre_credentials::clock::FixedClock;
use vercre_credentials::core::OneMany;
use vercre_credentials::{
    Config, Credentials, Err, PresentationOptions, VerifiableCredential,
};

const NOW: i64 = 1_700_000_000;

fn party() -> Credentials {
    let identity = Credentials::create_identity();
    Credentials::new(Config::new().private_key(identity.private_key))
        .expect("should create")
        .with_clock(FixedClock(NOW))
}

fn subject(value: Value) -> Map<String, Value> {
    let Value::Object(map) = value else { panic!("expected object") };
    map
}

fn credential(subject_did: &str) -> VerifiableCredential {
    VerifiableCredential {
        id: Some("urn:uuid:3978344f-8596-4c3a-a978-8fcaba3903c5".into()),
        type_: OneMany::Many(vec!["VerifiableCredential".into(), "EmailCredential".into()]),
        issuance_date: DateTime::from_timestamp(NOW - 60, 0),
        expiration_date: DateTime::from_timestamp(NOW + 3600, 0),
        credential_subject: subject(json!({"id": subject_did, "email": "alice@example.com"})),
        ..VerifiableCredential::default()
    }
}

// W3C properties map to JWT claims and back.
#[tokio::test]
async fn issue_and_verify() {
    let issuer = party();
    let holder = party();
    let holder_did = holder.did().expect("did").to_string();

    let token =
        issuer.issue_verifiable_credential(credential(&holder_did)).await.expect("should issue");

    let verified = holder.verify_credential(&token).await.expect("should verify");
    let payload = &verified.verified.payload;
    assert_eq!(payload["sub"], holder_did.as_str());
    assert_eq!(payload["nbf"], NOW - 60);
    assert_eq!(payload["exp"], NOW + 3600);
    assert_eq!(payload["jti"], "urn:uuid:3978344f-8596-4c3a-a978-8fcaba3903c5");
    assert!(payload["vc"]["credentialSubject"].get("id").is_none());

    let decoded = verified.credential;
    assert_eq!(decoded.issuer.as_deref(), issuer.did());
    assert_eq!(decoded.credential_subject["id"], holder_did.as_str());
    assert_eq!(decoded.credential_subject["email"], "alice@example.com");
    assert_eq!(decoded.issuance_date, DateTime::from_timestamp(NOW - 60, 0));
    assert_eq!(decoded.expiration_date, DateTime::from_timestamp(NOW + 3600, 0));
    assert!(decoded.type_.contains(&"EmailCredential".to_string()));
}

#[tokio::test]
async fn invalid_credentials() {
    let issuer = party();

    let err = issuer
        .issue_verifiable_credential(VerifiableCredential::default())
        .await
        .expect_err("should fail");
    assert!(err.is(Err::InvalidInput));

    let mut wrong_issuer = credential("did:ethr:0xbc3ae59bc76f894822622cdef7a2018dbe353840");
    wrong_issuer.issuer = Some("did:web:someone.else".into());
    let err = issuer.issue_verifiable_credential(wrong_issuer).await.expect_err("should fail");
    assert!(err.is(Err::InvalidInput));

    // a signed token that is not a credential
    let token = issuer.sign_jwt(Map::new(), None).await.expect("should sign");
    let err = issuer.verify_credential(&token).await.expect_err("should fail");
    assert!(err.is(Err::InvalidFormat));
}

// Presented credentials are verified independently of the presentation.
#[tokio::test]
async fn presentation() {
    let issuer = party();
    let holder = party();
    let verifier = party();
    let holder_did = holder.did().expect("did").to_string();
    let verifier_did = verifier.did().expect("did").to_string();

    let credential =
        issuer.issue_verifiable_credential(credential(&holder_did)).await.expect("should issue");
    let token = holder
        .create_verifiable_presentation(
            vec![credential, "not.a.credential".into()],
            PresentationOptions {
                audience: Some(OneMany::One(verifier_did.clone())),
                nonce: Some("n-0S6_WzA2Mj".into()),
                ..PresentationOptions::default()
            },
        )
        .await
        .expect("should present");

    let verified = verifier.verify_presentation(&token, None).await.expect("should verify");
    assert_eq!(verified.presentation.holder.as_deref(), Some(holder_did.as_str()));
    assert_eq!(verified.verified.payload["nonce"], "n-0S6_WzA2Mj");
    assert_eq!(verified.credentials.verified.len(), 1);
    assert_eq!(verified.credentials.invalid.len(), 1);

    // the presentation is not addressed to the issuer
    let err = issuer.verify_presentation(&token, None).await.expect_err("should fail");
    assert!(err.is(Err::InvalidAudience));
    issuer.verify_presentation(&token, Some(&verifier_did)).await.expect("explicit audience");
}

#[tokio::test]
async fn empty_presentation() {
    let holder = party();
    let err = holder
        .create_verifiable_presentation(Vec::new(), PresentationOptions::default())
        .await
        .expect_err("should fail");
    assert!(err.is(Err::InvalidInput));
}

//! Tests for building signed requests.

use insta::assert_json_snapshot as assert_snapshot;
use serde_json::{json, Map, Value};
use vercre_credentials::clock::FixedClock;
use vercre_credentials::{
    AccountType, Config, Contract, Credentials, DisclosureParams, Err, Expiry,
    PersonalSignParams, TxRequestOptions, TypedDataParams, VerificationRequestParams,
    VerifyOptions,
};

const NOW: i64 = 1_700_000_000;
const PRIVATE_KEY: &str = "74894f8853f90e6e3d6dfdd343eb0eb70cca06e552ed8af80adadcc573b35da3";

fn credentials() -> Credentials {
    Credentials::new(Config::new().private_key(PRIVATE_KEY))
        .expect("should create")
        .with_clock(FixedClock(NOW))
}

async fn payload(credentials: &Credentials, token: &str) -> Map<String, Value> {
    credentials.verify_jwt(token, &VerifyOptions::default()).await.expect("should verify").payload
}

// Recognised parameters are carried into the request, anything else is dropped.
#[tokio::test]
async fn disclosure_request() {
    let credentials = credentials();
    let params = DisclosureParams::from_value(&json!({
        "requested": ["name", "phone"],
        "notifications": true,
        "callbackUrl": "https://app.example/callback",
        "networkId": "0x4",
        "rpcUrl": "https://rinkeby.infura.io",
        "accountType": "keypair",
        "favouriteColour": "blue"
    }))
    .expect("should parse");

    let token = credentials.create_disclosure_request(params).await.expect("should create");
    let payload = payload(&credentials, &token).await;

    assert_snapshot!(payload, {".iss" => "[iss]"}, @r###"
    {
      "act": "keypair",
      "callback": "https://app.example/callback",
      "claims": {
        "user_info": {
          "name": null,
          "phone": null
        }
      },
      "exp": 1700000600,
      "iat": 1700000000,
      "iss": "[iss]",
      "net": "0x4",
      "permissions": [
        "notifications"
      ],
      "requested": [
        "name",
        "phone"
      ],
      "rpc": "https://rinkeby.infura.io",
      "type": "shareReq"
    }
    "###);
}

#[tokio::test]
async fn account_types() {
    let credentials = credentials();
    for account_type in ["general", "segregated", "keypair", "none"] {
        let params = DisclosureParams::from_value(&json!({"accountType": account_type}))
            .expect("should parse");
        let token = credentials.create_disclosure_request(params).await.expect("should create");
        assert_eq!(payload(&credentials, &token).await["act"], account_type);
    }

    let err = DisclosureParams::from_value(&json!({"accountType": "admin"}))
        .expect_err("should fail");
    assert!(err.is(Err::InvalidRequest));
    assert_eq!(err.to_string(), "Unsupported accountType admin");

    let params = DisclosureParams {
        account_type: Some(AccountType::Segregated),
        ..DisclosureParams::default()
    };
    credentials.create_disclosure_request(params).await.expect("should create");
}

#[tokio::test]
async fn private_chain() {
    let credentials = credentials();
    let params = DisclosureParams {
        rpc_url: Some("http://localhost:8545".into()),
        ..DisclosureParams::default()
    };
    let err = credentials.create_disclosure_request(params).await.expect_err("should fail");
    assert_eq!(err.to_string(), "rpcUrl was specified but no networkId");

    let params = DisclosureParams {
        rpc_url: Some("http://localhost:8545".into()),
        network_id: Some("0x539".into()),
        ..DisclosureParams::default()
    };
    let token = credentials.create_disclosure_request(params).await.expect("should create");
    let payload = payload(&credentials, &token).await;
    assert_eq!(payload["net"], "0x539");
    assert_eq!(payload["rpc"], "http://localhost:8545");
}

#[tokio::test]
async fn expiry() {
    let credentials = credentials();
    let params = DisclosureParams {
        expiry: Some(Expiry::At(NOW + 60)),
        ..DisclosureParams::default()
    };
    let token = credentials.create_disclosure_request(params).await.expect("should create");
    assert_eq!(payload(&credentials, &token).await["exp"], NOW + 60);

    let params = DisclosureParams::from_value(&json!({"expiresIn": 30})).expect("should parse");
    let token = credentials.create_disclosure_request(params).await.expect("should create");
    assert_eq!(payload(&credentials, &token).await["exp"], NOW + 30);
}

#[tokio::test]
async fn expiry_out_of_range() {
    let credentials = credentials();
    let params =
        DisclosureParams::from_value(&json!({"expiresIn": i64::MAX})).expect("should parse");
    let err = credentials.create_disclosure_request(params).await.expect_err("should fail");
    assert!(err.is(Err::InvalidRequest));
    assert_eq!(err.to_string(), format!("expiresIn out of range: {}", i64::MAX));
}

#[tokio::test]
async fn no_signer() {
    let credentials = Credentials::new(
        Config::new().address("0xbc3ae59bc76f894822622cdef7a2018dbe353840"),
    )
    .expect("should create");
    let err = credentials
        .create_disclosure_request(DisclosureParams::default())
        .await
        .expect_err("should fail");
    assert_eq!(err.to_string(), "No Signing Identity configured");
}

// The countersignature expiry is independent of the request's own expiry.
#[tokio::test]
async fn verification_request() {
    let credentials = credentials();
    let params = VerificationRequestParams::from_value(&json!({
        "unsignedClaim": {"employer": "Acme"},
        "sub": "did:ethr:0xbc3ae59bc76f894822622cdef7a2018dbe353840",
        "callbackUrl": "https://app.example/signed",
        "rexp": 1000,
        "expiresIn": 120
    }))
    .expect("should parse");

    let token =
        credentials.create_verification_signature_request(params).await.expect("should create");
    let payload = payload(&credentials, &token).await;
    assert_eq!(payload["type"], "verReq");
    assert_eq!(payload["rexp"], 1000);
    assert_eq!(payload["exp"], NOW + 120);
    assert_eq!(payload["unsignedClaim"], json!({"employer": "Acme"}));
    assert_eq!(payload["callback"], "https://app.example/signed");
}

#[tokio::test]
async fn typed_data_request() {
    let credentials = credentials();
    let typed_data = json!({
        "types": {
            "EIP712Domain": [{"name": "name", "type": "string"}],
            "Greeting": [{"name": "text", "type": "string"}]
        },
        "primaryType": "Greeting",
        "domain": {"name": "Example"},
        "message": {"text": "hello"}
    });

    let mut missing = typed_data.clone();
    missing.as_object_mut().expect("object").remove("domain");
    let params = TypedDataParams::from_value(&json!({"typedData": missing})).expect("should parse");
    let err =
        credentials.create_typed_data_signature_request(params).await.expect_err("should fail");
    assert!(err.is(Err::InvalidRequest));
    assert_eq!(err.to_string(), "Invalid EIP712 Request, must include 'domain'");

    let params = TypedDataParams::from_value(&json!({
        "typedData": typed_data,
        "from": "0xbc3ae59bc76f894822622cdef7a2018dbe353840",
        "net": "0x1"
    }))
    .expect("should parse");
    let token =
        credentials.create_typed_data_signature_request(params).await.expect("should create");
    let payload = payload(&credentials, &token).await;
    assert_eq!(payload["type"], "typedDataSigReq");
    assert_eq!(payload["typedData"], typed_data);
}

#[tokio::test]
async fn personal_sign_request() {
    let credentials = credentials();
    let params = PersonalSignParams {
        data: "0xdeadbeef".into(),
        from: Some("0xbc3ae59bc76f894822622cdef7a2018dbe353840".into()),
        ..PersonalSignParams::default()
    };
    let token = credentials.create_personal_sign_request(params).await.expect("should create");
    let payload = payload(&credentials, &token).await;
    assert_eq!(payload["type"], "personalSigReq");
    assert_eq!(payload["data"], "0xdeadbeef");
    assert!(!payload.contains_key("callback"));

    let params = PersonalSignParams::from_value(&json!({
        "from": "0xbc3ae59bc76f894822622cdef7a2018dbe353840"
    }))
    .expect("should parse");
    let err = credentials.create_personal_sign_request(params).await.expect_err("should fail");
    assert!(err.is(Err::InvalidRequest));
    assert_eq!(err.to_string(), "Personal sign request must include 'data'");
}

#[tokio::test]
async fn transaction_request() {
    let credentials = credentials();
    let contract = Contract::from_value(&json!([{
        "type": "function",
        "name": "updateStatus",
        "inputs": [{"name": "status", "type": "string"}],
        "stateMutability": "nonpayable"
    }]))
    .expect("should parse");
    let tx = contract
        .at("0x41566e3a081f5032bdcad470adb797635ddfe1f0")
        .expect("address")
        .call("updateStatus", &[json!("hello")])
        .expect("should describe");

    let options = TxRequestOptions {
        callback_url: Some("https://app.example/tx".into()),
        network_id: Some("0x4".into()),
        label: Some("Status".into()),
        ..TxRequestOptions::default()
    };
    let token = credentials.create_tx_request(tx, options).await.expect("should create");
    let payload = payload(&credentials, &token).await;

    assert_eq!(payload["type"], "ethtx");
    assert_eq!(payload["to"], "0x41566e3a081f5032bdcad470adb797635ddfe1f0");
    assert_eq!(payload["function"], r#"updateStatus(string "hello")"#);
    assert_eq!(payload["net"], "0x4");
    assert_eq!(payload["label"], "Status");
    assert_eq!(payload["exp"], NOW + 600);
}

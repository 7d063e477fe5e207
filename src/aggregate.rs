//! # Credential Aggregation
//!
//! Verifies a set of credential tokens independently, partitioning them into verified and
//! invalid. A failing credential never fails the set.

use futures::future::join_all;
use serde::Serialize;

use crate::gateway::{Gateway, Verified, VerifyOptions};

/// Credentials partitioned by verification outcome. Every input token appears in exactly
/// one of the lists.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Partition {
    /// Successfully verified credentials, in input order.
    pub verified: Vec<Verified>,

    /// Tokens that failed verification, in input order.
    pub invalid: Vec<String>,
}

/// Verify each token concurrently and partition the results.
pub async fn aggregate(gateway: &dyn Gateway, tokens: &[String]) -> Partition {
    let options = VerifyOptions::default();
    let results = join_all(tokens.iter().map(|token| gateway.verify(token, &options))).await;

    let mut partition = Partition::default();
    for (token, result) in tokens.iter().zip(results) {
        match result {
            Ok(verified) => partition.verified.push(verified),
            Err(e) => {
                tracing::warn!("invalid credential: {e}");
                partition.invalid.push(token.clone());
            }
        }
    }
    partition
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use keyring::KeyPair;
    use serde_json::{json, Map, Value};

    use super::*;
    use crate::clock::FixedClock;
    use crate::config::Config;
    use crate::gateway::JwtGateway;
    use crate::identity;

    #[tokio::test]
    async fn partial_failure() {
        let config = Config::new().private_key(KeyPair::generate().private_key_hex());
        let identity = identity::resolve(config).expect("should resolve");
        let gateway = JwtGateway::new(identity, Arc::new(FixedClock(1_700_000_000)));

        let mut tokens = Vec::new();
        for n in 0..3 {
            let Value::Object(claims) = json!({"claim": {"n": n}}) else { panic!("object") };
            tokens.push(gateway.sign(claims, None).await.expect("should sign"));
        }
        tokens.insert(1, "not.a.token".to_string());
        let mut truncated = gateway.sign(Map::new(), None).await.expect("should sign");
        truncated.truncate(truncated.len() - 4);
        tokens.push(truncated);

        let partition = aggregate(&gateway, &tokens).await;
        assert_eq!(partition.verified.len(), 3);
        assert_eq!(partition.invalid, vec![tokens[1].clone(), tokens[4].clone()]);
        assert_eq!(partition.verified[2].payload["claim"]["n"], 2);
    }
}

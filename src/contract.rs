//! # Contract
//!
//! Describes contract function calls for transaction requests. The counterparty encodes
//! the call, so only the human readable description `name(type value, ...)` is built here.

use did_core::error::Err;
use did_core::{tracerr, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::request::transaction::TxParams;

/// A contract ABI entry.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct AbiItem {
    /// Entry kind: `function`, `event`, `constructor`, ...
    #[serde(rename = "type")]
    pub type_: String,

    /// Function or event name.
    pub name: String,

    /// Parameters.
    pub inputs: Vec<AbiParam>,

    /// Legacy read-only marker.
    pub constant: Option<bool>,

    /// `pure`, `view`, `nonpayable` or `payable`.
    pub state_mutability: Option<String>,
}

impl AbiItem {
    fn is_read_only(&self) -> bool {
        self.constant == Some(true)
            || matches!(self.state_mutability.as_deref(), Some("view" | "pure"))
    }
}

/// A function parameter.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct AbiParam {
    /// Parameter name.
    pub name: String,

    /// Solidity type, e.g. `uint256`.
    #[serde(rename = "type")]
    pub type_: String,
}

/// A contract interface.
#[derive(Clone, Debug, Default)]
pub struct Contract {
    abi: Vec<AbiItem>,
}

impl Contract {
    /// Create a contract from its ABI.
    #[must_use]
    pub const fn new(abi: Vec<AbiItem>) -> Self {
        Self { abi }
    }

    /// Read an ABI from JSON.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidInput` - the value is not an ABI array.
    pub fn from_value(abi: &Value) -> Result<Self> {
        match serde_json::from_value(abi.clone()) {
            Ok(abi) => Ok(Self::new(abi)),
            Err(e) => tracerr!(Err::InvalidInput, "Invalid contract ABI: {e}"),
        }
    }

    /// Bind the contract to a deployed address.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidInput` - `address` is not a chain address.
    pub fn at(&self, address: &str) -> Result<ContractInstance<'_>> {
        if !keyring::is_eth_address(address) {
            tracerr!(Err::InvalidInput, "Invalid contract address: {address}");
        }
        Ok(ContractInstance {
            contract: self,
            address: address.to_string(),
        })
    }
}

/// A contract bound to an address.
#[derive(Clone, Debug)]
pub struct ContractInstance<'a> {
    contract: &'a Contract,
    address: String,
}

impl ContractInstance<'_> {
    /// Describe a call to the named function as transaction parameters.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidInput` - the function is unknown, read-only, or called with the
    ///   wrong number of arguments.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<TxParams> {
        let Some(function) =
            self.contract.abi.iter().find(|item| item.type_ == "function" && item.name == name)
        else {
            tracerr!(Err::InvalidInput, "Contract has no function '{name}'");
        };
        if function.is_read_only() {
            tracerr!(Err::InvalidInput, "'{name}' is a constant function and cannot be sent");
        }
        if function.inputs.len() != args.len() {
            tracerr!(
                Err::InvalidInput,
                "'{name}' expects {} arguments, got {}",
                function.inputs.len(),
                args.len()
            );
        }

        let described: Vec<String> = function
            .inputs
            .iter()
            .zip(args)
            // JSON rendering quotes strings and leaves numbers and booleans bare
            .map(|(param, arg)| format!("{} {arg}", param.type_))
            .collect();

        Ok(TxParams {
            to: self.address.clone(),
            function: Some(format!("{name}({})", described.join(", "))),
            ..TxParams::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn token() -> Contract {
        Contract::from_value(&json!([
            {
                "type": "function",
                "name": "transfer",
                "inputs": [{"name": "to", "type": "address"}, {"name": "value", "type": "uint256"}],
                "stateMutability": "nonpayable"
            },
            {
                "type": "function",
                "name": "balanceOf",
                "inputs": [{"name": "owner", "type": "address"}],
                "constant": true
            }
        ]))
        .expect("should parse")
    }

    #[test]
    fn describe_call() {
        let contract = token();
        let tx = contract
            .at("0x41566e3a081f5032bdcad470adb797635ddfe1f0")
            .expect("address")
            .call("transfer", &[json!("0xbc3ae59bc76f894822622cdef7a2018dbe353840"), json!(5)])
            .expect("should describe");

        assert_eq!(tx.to, "0x41566e3a081f5032bdcad470adb797635ddfe1f0");
        assert_eq!(
            tx.function.as_deref(),
            Some(r#"transfer(address "0xbc3ae59bc76f894822622cdef7a2018dbe353840", uint256 5)"#)
        );
    }

    #[test]
    fn describe_bool_and_bytes() {
        let contract = Contract::from_value(&json!([{
            "type": "function",
            "name": "setFlag",
            "inputs": [{"name": "key", "type": "bytes32"}, {"name": "on", "type": "bool"}],
            "stateMutability": "nonpayable"
        }]))
        .expect("should parse");
        let key = format!("0x{}", "ab".repeat(32));
        let tx = contract
            .at("0x41566e3a081f5032bdcad470adb797635ddfe1f0")
            .expect("address")
            .call("setFlag", &[json!(key), json!(true)])
            .expect("should describe");

        assert_eq!(tx.function, Some(format!(r#"setFlag(bytes32 "{key}", bool true)"#)));
    }

    #[test]
    fn rejected_calls() {
        let contract = token();
        let instance = contract.at("0x41566e3a081f5032bdcad470adb797635ddfe1f0").expect("address");

        let err = instance.call("approve", &[]).expect_err("unknown");
        assert_eq!(err.to_string(), "Contract has no function 'approve'");

        let err = instance.call("balanceOf", &[json!("0x00")]).expect_err("constant");
        assert!(err.is(Err::InvalidInput));

        let err = instance.call("transfer", &[json!(1)]).expect_err("arity");
        assert_eq!(err.to_string(), "'transfer' expects 2 arguments, got 1");

        assert!(contract.at("0x1234").is_err());
    }
}

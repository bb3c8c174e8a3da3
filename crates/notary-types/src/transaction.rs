use alloy_primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};

/// A transaction to submit, or a call to simulate, against a ledger node.
///
/// Signing is delegated to the node: `from` must be one of the node's
/// managed accounts. A request without `to` creates a contract whose
/// bytecode is carried in `data`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(default, skip_serializing_if = "is_empty")]
    pub data: Bytes,
    #[serde(default, with = "crate::quantity::option", skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
    #[serde(default, with = "crate::quantity::option", skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u64>,
    #[serde(default, with = "crate::quantity::option", skip_serializing_if = "Option::is_none")]
    pub value: Option<u64>,
}

impl TransactionRequest {
    /// A function invocation on a deployed contract.
    pub fn call(from: Address, to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            data: data.into(),
            ..Default::default()
        }
    }

    /// A contract-creation transaction carrying `bytecode`.
    pub fn deploy(from: Address, bytecode: impl Into<Bytes>) -> Self {
        Self {
            from: Some(from),
            data: bytecode.into(),
            ..Default::default()
        }
    }

    pub fn with_gas(mut self, gas: Option<u64>) -> Self {
        self.gas = gas;
        self
    }

    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }
}

fn is_empty(data: &Bytes) -> bool {
    data.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_serializes_camel_case_hex() {
        let tx = TransactionRequest::call(
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            vec![0xab],
        )
        .with_gas(Some(90_000));
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["from"], "0x0101010101010101010101010101010101010101");
        assert_eq!(json["data"], "0xab");
        assert_eq!(json["gas"], "0x15f90");
        assert!(json.get("gasPrice").is_none());
        assert!(json.get("value").is_none());
    }

    #[test]
    fn deploy_has_no_recipient() {
        let tx = TransactionRequest::deploy(Address::ZERO, vec![0x60, 0x80]);
        assert!(tx.is_contract_creation());
        let json = serde_json::to_value(&tx).unwrap();
        assert!(json.get("to").is_none());
    }

    #[test]
    fn parse_from_rpc_params() {
        let tx: TransactionRequest = serde_json::from_str(
            r#"{"from":"0x0101010101010101010101010101010101010101","data":"0x00","gas":"0x10"}"#,
        )
        .unwrap();
        assert_eq!(tx.gas, Some(16));
        assert!(tx.to.is_none());
    }
}

use std::collections::BTreeMap;

use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event log emitted by a mined transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: Address,
    #[serde(default)]
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: Bytes,
    #[serde(default)]
    pub block_hash: Option<B256>,
    #[serde(default, with = "crate::quantity::option")]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub transaction_hash: Option<B256>,
    #[serde(default, with = "crate::quantity::option")]
    pub transaction_index: Option<u64>,
    #[serde(default, with = "crate::quantity::option")]
    pub log_index: Option<u64>,
    /// Fields this type does not model, kept verbatim.
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

/// The record returned once a submitted transaction is mined.
///
/// Only the fields the notary reasons about are typed; everything else the
/// node reports is preserved in `other` so nothing is dropped on the way to
/// the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(with = "crate::quantity")]
    pub transaction_index: u64,
    #[serde(default)]
    pub block_hash: Option<B256>,
    #[serde(default, with = "crate::quantity::option")]
    pub block_number: Option<u64>,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(with = "crate::quantity")]
    pub cumulative_gas_used: u64,
    #[serde(with = "crate::quantity")]
    pub gas_used: u64,
    /// `1` on success, `0` on revert. Absent on pre-Byzantium chains.
    #[serde(default, with = "crate::quantity::option")]
    pub status: Option<u64>,
    #[serde(default)]
    pub logs: Vec<Log>,
    #[serde(default)]
    pub logs_bloom: Bytes,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl TransactionReceipt {
    /// `false` only when the node reported an explicit failure status.
    pub fn succeeded(&self) -> bool {
        self.status != Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geth_receipt() -> Value {
        serde_json::json!({
            "transactionHash": "0x949e6011110eee750c48cd49e7b1d298ca2e66d42d8aee6dc4623532ffbd996c",
            "transactionIndex": "0x0",
            "blockHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "blockNumber": "0x2a",
            "from": "0x4a8a51797cde3aac2f7dc5c81c548428056a6d12",
            "to": "0x2222222222222222222222222222222222222222",
            "contractAddress": null,
            "cumulativeGasUsed": "0x5208",
            "gasUsed": "0x5208",
            "status": "0x1",
            "logs": [],
            "logsBloom": "0x00",
            "effectiveGasPrice": "0x3b9aca00",
            "type": "0x0"
        })
    }

    #[test]
    fn parse_geth_receipt() {
        let r: TransactionReceipt = serde_json::from_value(geth_receipt()).unwrap();
        assert_eq!(r.block_number, Some(42));
        assert_eq!(r.gas_used, 21_000);
        assert!(r.contract_address.is_none());
        assert!(r.succeeded());
    }

    #[test]
    fn unknown_fields_are_preserved() {
        let r: TransactionReceipt = serde_json::from_value(geth_receipt()).unwrap();
        assert_eq!(r.other["effectiveGasPrice"], "0x3b9aca00");
        assert_eq!(r.other["type"], "0x0");
    }

    #[test]
    fn reverted_status() {
        let mut raw = geth_receipt();
        raw["status"] = Value::String("0x0".into());
        let r: TransactionReceipt = serde_json::from_value(raw).unwrap();
        assert!(!r.succeeded());
    }
}

//! Conversion of ledger-native values into transport-safe JSON.
//!
//! Binary values (fixed and dynamic byte strings, addresses, hashes) become
//! `0x`-prefixed lower-case hex, which decodes back to the exact original
//! bytes. Sequences keep their order. Receipts and blocks become flat maps
//! in which every binary field is hex and every quantity a plain integer;
//! fields the node reports beyond the modelled ones pass through untouched.
//! A block whose proof-of-authority seal was moved out of `extraData`
//! reports no `extraData` at all.

use notary_abi::DynSolValue;
use notary_types::{hex_prefixed, Block, Log, TransactionReceipt};
use serde_json::{Map, Value};

/// Normalize one decoded value.
pub fn normalize_value(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::FixedBytes(word, size) => Value::String(hex_prefixed(&word[..*size])),
        DynSolValue::Bytes(bytes) => Value::String(hex_prefixed(bytes)),
        DynSolValue::Address(address) => Value::String(hex_prefixed(address)),
        DynSolValue::Function(pointer) => Value::String(hex_prefixed(pointer)),
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::String(s) => Value::String(s.clone()),
        // integers beyond 64 bits would lose precision as JSON numbers
        DynSolValue::Uint(n, _) => match u64::try_from(*n) {
            Ok(n) => Value::from(n),
            Err(_) => Value::String(n.to_string()),
        },
        DynSolValue::Int(n, _) => match i64::try_from(*n) {
            Ok(n) => Value::from(n),
            Err(_) => Value::String(n.to_string()),
        },
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            normalize_sequence(items)
        }
    }
}

/// Normalize an ordered sequence, preserving order and length.
pub fn normalize_sequence(values: &[DynSolValue]) -> Value {
    Value::Array(values.iter().map(normalize_value).collect())
}

/// Normalize a function's decoded outputs: nothing becomes `null`, a single
/// output is returned bare, several become a list.
pub fn normalize_output(values: &[DynSolValue]) -> Value {
    match values {
        [] => Value::Null,
        [single] => normalize_value(single),
        many => normalize_sequence(many),
    }
}

fn hex_opt<T: AsRef<[u8]>>(value: Option<&T>) -> Value {
    value.map_or(Value::Null, |v| Value::String(hex_prefixed(v)))
}

fn hex_list<T: AsRef<[u8]>>(values: &[T]) -> Value {
    Value::Array(values.iter().map(|v| Value::String(hex_prefixed(v))).collect())
}

fn num_opt(value: Option<u64>) -> Value {
    value.map_or(Value::Null, Value::from)
}

pub fn normalize_log(log: &Log) -> Value {
    let mut map = Map::new();
    map.insert("address".into(), Value::String(hex_prefixed(log.address)));
    map.insert("topics".into(), hex_list(&log.topics));
    map.insert("data".into(), Value::String(hex_prefixed(&log.data)));
    map.insert("blockHash".into(), hex_opt(log.block_hash.as_ref()));
    map.insert("blockNumber".into(), num_opt(log.block_number));
    map.insert("transactionHash".into(), hex_opt(log.transaction_hash.as_ref()));
    map.insert("transactionIndex".into(), num_opt(log.transaction_index));
    map.insert("logIndex".into(), num_opt(log.log_index));
    for (key, value) in &log.other {
        map.entry(key.clone()).or_insert_with(|| value.clone());
    }
    Value::Object(map)
}

/// Flatten a receipt for the caller. No field is dropped.
pub fn normalize_receipt(receipt: &TransactionReceipt) -> Value {
    let mut map = Map::new();
    map.insert("transactionHash".into(), Value::String(hex_prefixed(receipt.transaction_hash)));
    map.insert("transactionIndex".into(), Value::from(receipt.transaction_index));
    map.insert("blockHash".into(), hex_opt(receipt.block_hash.as_ref()));
    map.insert("blockNumber".into(), num_opt(receipt.block_number));
    map.insert("from".into(), Value::String(hex_prefixed(receipt.from)));
    map.insert("to".into(), hex_opt(receipt.to.as_ref()));
    map.insert("contractAddress".into(), hex_opt(receipt.contract_address.as_ref()));
    map.insert("cumulativeGasUsed".into(), Value::from(receipt.cumulative_gas_used));
    map.insert("gasUsed".into(), Value::from(receipt.gas_used));
    map.insert("status".into(), num_opt(receipt.status));
    map.insert(
        "logs".into(),
        Value::Array(receipt.logs.iter().map(normalize_log).collect()),
    );
    map.insert("logsBloom".into(), Value::String(hex_prefixed(&receipt.logs_bloom)));
    for (key, value) in &receipt.other {
        map.entry(key.clone()).or_insert_with(|| value.clone());
    }
    Value::Object(map)
}

pub fn normalize_block(block: &Block) -> Value {
    let mut map = Map::new();
    map.insert("number".into(), num_opt(block.number));
    map.insert("hash".into(), hex_opt(block.hash.as_ref()));
    map.insert("parentHash".into(), Value::String(hex_prefixed(block.parent_hash)));
    map.insert("timestamp".into(), Value::from(block.timestamp));
    // the seal moved out of extraData leaves nothing worth reporting there
    if !(block.extra_data.is_empty() && block.proof_of_authority_data.is_some()) {
        map.insert("extraData".into(), Value::String(hex_prefixed(&block.extra_data)));
    }
    map.insert(
        "proofOfAuthorityData".into(),
        hex_opt(block.proof_of_authority_data.as_ref()),
    );
    map.insert("transactions".into(), hex_list(&block.transactions));
    for (key, value) in &block.other {
        map.entry(key.clone()).or_insert_with(|| value.clone());
    }
    Value::Object(map)
}

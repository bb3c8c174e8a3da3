use std::collections::BTreeMap;

use alloy_primitives::{Bytes, B256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A block header as returned by `eth_getBlockByNumber` without full
/// transaction bodies.
///
/// On proof-of-authority networks the signer seal lives in the extra-data
/// field, which then exceeds the 32 bytes a standard header allows. The
/// client's PoA middleware moves it to `proofOfAuthorityData` before the
/// block is parsed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(default, with = "crate::quantity::option")]
    pub number: Option<u64>,
    #[serde(default)]
    pub hash: Option<B256>,
    pub parent_hash: B256,
    #[serde(with = "crate::quantity")]
    pub timestamp: u64,
    #[serde(default)]
    pub extra_data: Bytes,
    #[serde(default)]
    pub proof_of_authority_data: Option<Bytes>,
    #[serde(default)]
    pub transactions: Vec<B256>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

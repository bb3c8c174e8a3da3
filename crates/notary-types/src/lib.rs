//! Foundation types for the document notary.
//!
//! Every value that crosses the ledger transport boundary is modelled here.
//! Fixed-length identifiers, byte strings, and 256-bit integers come from
//! `alloy-primitives`; this crate adds the hex quantity encoding nodes use
//! for small integers and the transaction, receipt, and block records a
//! ledger node returns.
//!
//! # Key Types
//!
//! - [`Address`]: 20-byte account or contract address
//! - [`B256`]: 32-byte hash (transaction hashes, block hashes, topics)
//! - [`Bytes`]: variable-length byte string (calldata, bytecode, log data)
//! - [`TransactionRequest`]: a transaction or simulated call to submit
//! - [`TransactionReceipt`]: the record of a mined transaction
//! - [`Block`]: a block header as reported by the node

pub mod block;
pub mod error;
pub mod quantity;
pub mod receipt;
pub mod transaction;

pub use alloy_primitives::{hex, keccak256, Address, Bytes, B256, I256, U256};
pub use block::Block;
pub use error::TypeError;
pub use receipt::{Log, TransactionReceipt};
pub use transaction::TransactionRequest;

/// Encode bytes as `0x`-prefixed lower-case hex.
///
/// Addresses display with a mixed-case checksum; this is the form used
/// whenever a value leaves the notary.
pub fn hex_prefixed(bytes: impl AsRef<[u8]>) -> String {
    hex::encode_prefixed(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_hex_is_lower_case() {
        assert_eq!(hex_prefixed([0xABu8, 0x01]), "0xab01");
        assert_eq!(hex_prefixed(Vec::<u8>::new()), "0x");
    }

    #[test]
    fn address_renders_lower_case() {
        let a: Address = "0x4A8A51797Cde3aAC2F7Dc5C81c548428056a6D12".parse().unwrap();
        assert_eq!(hex_prefixed(a), "0x4a8a51797cde3aac2f7dc5c81c548428056a6d12");
    }

    #[test]
    fn unprefixed_bytecode_parses() {
        // solc emits bytecode objects without the 0x prefix
        let b: Bytes = "6080604052".parse().unwrap();
        assert_eq!(b.len(), 5);
        assert_eq!(hex_prefixed(&b), "0x6080604052");
    }

    #[test]
    fn wrong_length_hash_rejected() {
        assert!("0xabcd".parse::<B256>().is_err());
        assert!(serde_json::from_str::<Address>("\"0x12\"").is_err());
    }
}

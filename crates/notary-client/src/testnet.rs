//! In-process test network.
//!
//! [`InMemoryChain`] answers the subset of the node JSON-RPC surface the
//! client uses, with ten prefunded accounts that sign implicitly, one block
//! per transaction, and proof-of-authority style 97-byte extra data in every
//! header. Contracts do not run bytecode: every created contract is a
//! native document registry keyed by function selector.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use notary_abi::{DynSolType, DynSolValue};
use notary_types::{keccak256, quantity, Address, Bytes, Log, TransactionReceipt, TransactionRequest, B256};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::TransportKind;
use crate::error::{ClientError, ClientResult};
use crate::transport::JsonRpcTransport;

pub const DEFAULT_ACCOUNTS: usize = 10;
pub const CHAIN_ID: u64 = 1337;
const BLOCK_GAS_LIMIT: u64 = 8_000_000;
const BASE_GAS: u64 = 21_000;
/// 32 bytes of signer vanity followed by a 65-byte seal.
const EXTRA_DATA_LEN: usize = 97;

const ADD_DOCUMENT: &str = "addDocument(string,bytes32)";
const VALIDATE_ONE: &str = "validateOne(string,bytes32)";
const DOCUMENT_ADDED: &str = "DocumentAdded(string,bytes32)";

/// When submitted transactions are mined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MiningMode {
    /// Every transaction is mined in its own block as soon as it arrives.
    #[default]
    Instant,
    /// Transactions stay pending until [`InMemoryChain::mine`] is called.
    Manual,
}

fn selector(signature: &str) -> [u8; 4] {
    let digest = keccak256(signature);
    [digest[0], digest[1], digest[2], digest[3]]
}

/// ABI encoding of a `(string, bytes32)` pair.
fn encode_document(user: &str, hash: B256) -> Vec<u8> {
    DynSolValue::Tuple(vec![
        DynSolValue::String(user.to_string()),
        DynSolValue::FixedBytes(hash, 32),
    ])
    .abi_encode_params()
}

#[derive(Debug, Default)]
struct DocumentRegistry {
    documents: HashMap<String, Vec<B256>>,
}

impl DocumentRegistry {
    fn decode_args(data: &[u8]) -> Result<(String, B256), String> {
        let decoded = DynSolType::Tuple(vec![DynSolType::String, DynSolType::FixedBytes(32)])
            .abi_decode_params(data)
            .map_err(|e| format!("invalid arguments: {e}"))?;
        match decoded.as_tuple() {
            Some([DynSolValue::String(user), DynSolValue::FixedBytes(hash, 32)]) => {
                Ok((user.clone(), *hash))
            }
            _ => Err("invalid arguments".into()),
        }
    }

    fn contains(&self, user: &str, hash: &B256) -> bool {
        self.documents
            .get(user)
            .is_some_and(|hashes| hashes.contains(hash))
    }

    /// Run a state-changing invocation. Returns the event payloads emitted.
    fn transact(&mut self, contract: Address, calldata: &[u8]) -> Result<Vec<(Vec<B256>, Vec<u8>)>, String> {
        let (sel, args) = split_selector(calldata)?;
        if sel == selector(ADD_DOCUMENT) {
            let (user, hash) = Self::decode_args(args)?;
            if !self.contains(&user, &hash) {
                self.documents.entry(user.clone()).or_default().push(hash);
            }
            debug!(%contract, user, "document recorded");
            let topic = keccak256(DOCUMENT_ADDED);
            Ok(vec![(vec![topic], encode_document(&user, hash))])
        } else if sel == selector(VALIDATE_ONE) {
            Ok(Vec::new())
        } else {
            Err("execution reverted".into())
        }
    }

    /// Run a read-only invocation and return the encoded return data.
    fn call(&self, calldata: &[u8]) -> Result<Vec<u8>, String> {
        let (sel, args) = split_selector(calldata)?;
        if sel == selector(VALIDATE_ONE) {
            let (user, hash) = Self::decode_args(args)?;
            let found = if self.contains(&user, &hash) {
                vec![DynSolValue::FixedBytes(hash, 32)]
            } else {
                Vec::new()
            };
            Ok(DynSolValue::Tuple(vec![DynSolValue::Array(found)]).abi_encode_params())
        } else if sel == selector(ADD_DOCUMENT) {
            Self::decode_args(args)?;
            Ok(Vec::new())
        } else {
            Err("execution reverted".into())
        }
    }
}

fn split_selector(calldata: &[u8]) -> Result<([u8; 4], &[u8]), String> {
    if calldata.len() < 4 {
        return Err("execution reverted".into());
    }
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&calldata[..4]);
    Ok((sel, &calldata[4..]))
}

#[derive(Debug)]
struct PendingTx {
    hash: B256,
    from: Address,
    nonce: u64,
    to: Option<Address>,
    data: Bytes,
}

#[derive(Debug)]
struct ChainState {
    accounts: Vec<Address>,
    nonces: HashMap<Address, u64>,
    blocks: Vec<Value>,
    pending: Vec<PendingTx>,
    receipts: HashMap<B256, TransactionReceipt>,
    contracts: HashMap<Address, DocumentRegistry>,
}

impl ChainState {
    fn new(accounts: usize) -> Self {
        let accounts = (0..accounts).map(test_account).collect();
        let mut state = Self {
            accounts,
            nonces: HashMap::new(),
            blocks: Vec::new(),
            pending: Vec::new(),
            receipts: HashMap::new(),
            contracts: HashMap::new(),
        };
        state.push_block(None, 0);
        state
    }

    fn head_number(&self) -> u64 {
        self.blocks.len() as u64 - 1
    }

    fn push_block(&mut self, tx: Option<B256>, gas_used: u64) -> (B256, u64) {
        let number = self.blocks.len() as u64;
        let parent = self
            .blocks
            .last()
            .and_then(|b| b["hash"].as_str())
            .and_then(|h| h.parse::<B256>().ok())
            .unwrap_or(B256::ZERO);
        let parent_time = self
            .blocks
            .last()
            .and_then(|b| b["timestamp"].as_str())
            .and_then(|t| quantity::parse(t).ok())
            .unwrap_or(0);
        let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
        let timestamp = now.max(parent_time + u64::from(number > 0));

        let mut preimage = number.to_be_bytes().to_vec();
        preimage.extend_from_slice(parent.as_slice());
        if let Some(tx) = tx {
            preimage.extend_from_slice(tx.as_slice());
        }
        let hash = keccak256(&preimage);

        let vanity = b"notary-testnet";
        let mut extra = vec![0u8; EXTRA_DATA_LEN];
        extra[..vanity.len()].copy_from_slice(vanity);
        self.blocks.push(json!({
            "number": quantity::format(number),
            "hash": hash,
            "parentHash": parent,
            "timestamp": quantity::format(timestamp),
            "extraData": Bytes::from(extra),
            "miner": Address::ZERO,
            "difficulty": "0x2",
            "gasLimit": quantity::format(BLOCK_GAS_LIMIT),
            "gasUsed": quantity::format(gas_used),
            "transactions": tx.into_iter().collect::<Vec<_>>(),
        }));
        (hash, number)
    }

    fn submit(&mut self, request: TransactionRequest) -> ClientResult<B256> {
        let from = request
            .from
            .ok_or_else(|| rpc_error(-32000, "missing from address"))?;
        if !self.accounts.contains(&from) {
            return Err(rpc_error(-32000, &format!("unknown account {from}")));
        }
        let nonce = self.nonces.entry(from).or_insert(0);
        let current = *nonce;
        *nonce += 1;

        let mut preimage = from.to_vec();
        preimage.extend_from_slice(&current.to_be_bytes());
        preimage.extend_from_slice(&request.data);
        let hash = keccak256(&preimage);

        self.pending.push(PendingTx {
            hash,
            from,
            nonce: current,
            to: request.to,
            data: request.data,
        });
        Ok(hash)
    }

    fn mine_pending(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        for tx in pending {
            self.mine(tx);
        }
        count
    }

    fn mine(&mut self, tx: PendingTx) {
        let gas_used = BASE_GAS + 16 * tx.data.len() as u64;
        let mut contract_address = None;
        let mut events = Vec::new();
        let mut status = 1;

        match tx.to {
            None => {
                let address = tx.from.create(tx.nonce);
                self.contracts.insert(address, DocumentRegistry::default());
                contract_address = Some(address);
            }
            Some(to) => {
                if let Some(registry) = self.contracts.get_mut(&to) {
                    match registry.transact(to, &tx.data) {
                        Ok(emitted) => events = emitted,
                        Err(_) => status = 0,
                    }
                }
            }
        }

        let (block_hash, block_number) = self.push_block(Some(tx.hash), gas_used);
        let logs = events
            .into_iter()
            .enumerate()
            .map(|(index, (topics, data))| Log {
                address: tx.to.unwrap_or(Address::ZERO),
                topics,
                data: data.into(),
                block_hash: Some(block_hash),
                block_number: Some(block_number),
                transaction_hash: Some(tx.hash),
                transaction_index: Some(0),
                log_index: Some(index as u64),
                other: Default::default(),
            })
            .collect();

        let mut other = std::collections::BTreeMap::new();
        other.insert("effectiveGasPrice".to_string(), json!("0x1"));
        other.insert("type".to_string(), json!("0x0"));

        self.receipts.insert(
            tx.hash,
            TransactionReceipt {
                transaction_hash: tx.hash,
                transaction_index: 0,
                block_hash: Some(block_hash),
                block_number: Some(block_number),
                from: tx.from,
                to: tx.to,
                contract_address,
                cumulative_gas_used: gas_used,
                gas_used,
                status: Some(status),
                logs,
                logs_bloom: Bytes::from(vec![0u8; 256]),
                other,
            },
        );
    }

    fn call(&self, request: &TransactionRequest) -> ClientResult<Bytes> {
        let Some(to) = request.to else {
            return Ok(Bytes::default());
        };
        match self.contracts.get(&to) {
            Some(registry) => registry
                .call(&request.data)
                .map(Bytes::from)
                .map_err(|message| rpc_error(-32000, &message)),
            None => Ok(Bytes::default()),
        }
    }

    fn block_by_tag(&self, tag: &str) -> ClientResult<Value> {
        let number = match tag {
            "latest" | "pending" | "safe" | "finalized" => self.head_number(),
            "earliest" => 0,
            hex => quantity::parse(hex).map_err(|e| rpc_error(-32602, &e.to_string()))?,
        };
        Ok(self
            .blocks
            .get(number as usize)
            .cloned()
            .unwrap_or(Value::Null))
    }

    fn block_by_hash(&self, hash: &str) -> Value {
        self.blocks
            .iter()
            .find(|b| b["hash"].as_str().is_some_and(|h| h.eq_ignore_ascii_case(hash)))
            .cloned()
            .unwrap_or(Value::Null)
    }
}

fn test_account(index: usize) -> Address {
    Address::from_word(keccak256(format!("notary-testnet-account-{index}")))
}

fn rpc_error(code: i64, message: &str) -> ClientError {
    ClientError::Rpc {
        code,
        message: message.to_string(),
    }
}

fn param<T: serde::de::DeserializeOwned>(params: &Value, index: usize) -> ClientResult<T> {
    let raw = params
        .get(index)
        .cloned()
        .ok_or_else(|| rpc_error(-32602, &format!("missing parameter {index}")))?;
    serde_json::from_value(raw).map_err(|e| rpc_error(-32602, &format!("parameter {index}: {e}")))
}

/// In-memory ledger peer for tests and local development.
#[derive(Debug)]
pub struct InMemoryChain {
    state: Mutex<ChainState>,
    mode: MiningMode,
}

impl Default for InMemoryChain {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryChain {
    pub fn new() -> Self {
        Self::with_accounts(DEFAULT_ACCOUNTS)
    }

    pub fn with_accounts(accounts: usize) -> Self {
        Self {
            state: Mutex::new(ChainState::new(accounts)),
            mode: MiningMode::Instant,
        }
    }

    pub fn mining_mode(mut self, mode: MiningMode) -> Self {
        self.mode = mode;
        self
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn accounts(&self) -> Vec<Address> {
        self.state().accounts.clone()
    }

    pub fn block_number(&self) -> u64 {
        self.state().head_number()
    }

    pub fn pending_count(&self) -> usize {
        self.state().pending.len()
    }

    /// Mine every pending transaction, one block each. Returns how many were mined.
    pub fn mine(&self) -> usize {
        self.state().mine_pending()
    }

    /// Hashes recorded for `user` in the registry at `contract`, in insertion order.
    pub fn documents(&self, contract: &Address, user: &str) -> Vec<B256> {
        self.state()
            .contracts
            .get(contract)
            .and_then(|r| r.documents.get(user))
            .cloned()
            .unwrap_or_default()
    }

    fn handle(&self, method: &str, params: &Value) -> ClientResult<Value> {
        let mut state = self.state();
        match method {
            "eth_accounts" => Ok(json!(state.accounts)),
            "eth_chainId" => Ok(json!(quantity::format(CHAIN_ID))),
            "net_version" => Ok(json!(CHAIN_ID.to_string())),
            "eth_blockNumber" => Ok(json!(quantity::format(state.head_number()))),
            "eth_sendTransaction" => {
                let request: TransactionRequest = param(params, 0)?;
                let hash = state.submit(request)?;
                if self.mode == MiningMode::Instant {
                    state.mine_pending();
                }
                Ok(json!(hash))
            }
            "eth_getTransactionReceipt" => {
                let hash: B256 = param(params, 0)?;
                Ok(state
                    .receipts
                    .get(&hash)
                    .map(serde_json::to_value)
                    .transpose()?
                    .unwrap_or(Value::Null))
            }
            "eth_call" => {
                let request: TransactionRequest = param(params, 0)?;
                Ok(json!(state.call(&request)?))
            }
            "eth_getBlockByNumber" => {
                let tag: String = param(params, 0)?;
                state.block_by_tag(&tag)
            }
            "eth_getBlockByHash" => {
                let hash: String = param(params, 0)?;
                Ok(state.block_by_hash(&hash))
            }
            other => Err(rpc_error(-32601, &format!("method {other} not found"))),
        }
    }
}

#[async_trait]
impl JsonRpcTransport for InMemoryChain {
    fn kind(&self) -> TransportKind {
        TransportKind::Test
    }

    async fn request(&self, method: &str, params: Value) -> ClientResult<Value> {
        debug!(method, "testnet request");
        self.handle(method, &params)
    }
}

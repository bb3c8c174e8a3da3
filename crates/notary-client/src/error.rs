use notary_abi::AbiError;
use notary_artifact::ArtifactError;
use notary_types::{Address, B256};

/// Errors from ledger client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Function lookup, argument validation, or return-data decoding failed.
    #[error(transparent)]
    Abi(#[from] AbiError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// The connection to the node could not be used.
    #[error("transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error object.
    #[error("node error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The node refused to accept or execute a transaction.
    #[error("transaction failed: {0}")]
    TransactionFailure(String),

    /// No receipt appeared within the configured bound.
    #[error("transaction {tx_hash} not mined within {waited_secs}s")]
    MiningTimeout { tx_hash: B256, waited_secs: u64 },

    /// The transaction was mined with a failure status.
    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: B256 },

    #[error("no contract bound: deploy a contract or bind a known address first")]
    UnboundContract,

    #[error("contract already bound at {0}")]
    AlreadyBound(Address),

    #[error("ABI or bytecode missing: no deployable artifact available")]
    ArtifactMissing,

    #[error("no accounts available on the node")]
    NoAccountsAvailable,

    /// The key file could not be read or names no account.
    #[error("key file {path}: {reason}")]
    KeyFile { path: String, reason: String },

    /// The key file names an account the node does not manage.
    #[error("account {0} is not managed by the node")]
    UnknownAccount(Address),

    /// The node's answer did not have the expected shape.
    #[error("unexpected node response: {0}")]
    InvalidResponse(String),
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidResponse(e.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

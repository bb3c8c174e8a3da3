use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Placeholder for configuration values absent from the environment.
///
/// Absence is not an error at load time; the first operation that needs the
/// value fails instead.
pub const UNSET: &str = "No Value Set";

/// Environment variable holding the node address.
pub const NODE_ADDRESS_VAR: &str = "IPCProvider";
/// Environment variable holding the key file path.
pub const KEY_FILE_VAR: &str = "ETH_PK_FILE";

/// How the client reaches the ledger node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// In-process test network; no node address needed.
    #[default]
    Test,
    /// Local interprocess socket.
    Ipc,
    /// Persistent websocket stream.
    Websocket,
    /// Request/response HTTP.
    Http,
}

impl TransportKind {
    /// Guess the transport from the shape of a node address.
    pub fn infer(address: &str) -> Self {
        let lower = address.to_ascii_lowercase();
        if !is_set(address) {
            Self::Test
        } else if lower.starts_with("ws://") || lower.starts_with("wss://") {
            Self::Websocket
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Http
        } else {
            Self::Ipc
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Ipc => "ipc",
            Self::Websocket => "websocket",
            Self::Http => "http",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test" => Ok(Self::Test),
            "ipc" => Ok(Self::Ipc),
            "websocket" | "ws" => Ok(Self::Websocket),
            "http" | "https" => Ok(Self::Http),
            other => Err(ClientError::Transport(format!("unknown transport kind {other:?}"))),
        }
    }
}

/// Bounds on the wait for a transaction receipt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    pub poll_interval_ms: u64,
    pub timeout_secs: u64,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            timeout_secs: 120,
        }
    }
}

impl MiningConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Connection settings for a ledger node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub transport: TransportKind,
    /// Socket path or URL of the node.
    pub node_address: String,
    /// Keystore document naming the default signing account.
    pub key_file: String,
    pub mining: MiningConfig,
    /// Gas limit attached to submitted transactions; the node estimates when unset.
    pub gas_limit: Option<u64>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Test,
            node_address: UNSET.to_string(),
            key_file: UNSET.to_string(),
            mining: MiningConfig::default(),
            gas_limit: None,
        }
    }
}

impl NodeConfig {
    /// Read the node address and key file from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup. The transport is inferred
    /// from the node address.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |var: &str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| UNSET.to_string())
        };
        let node_address = read(NODE_ADDRESS_VAR);
        Self {
            transport: TransportKind::infer(&node_address),
            node_address,
            key_file: read(KEY_FILE_VAR),
            ..Self::default()
        }
    }

    pub fn test() -> Self {
        Self::default()
    }

    pub fn has_node_address(&self) -> bool {
        is_set(&self.node_address)
    }

    pub fn has_key_file(&self) -> bool {
        is_set(&self.key_file)
    }
}

/// Whether a configuration value was actually supplied.
pub fn is_set(value: &str) -> bool {
    !value.trim().is_empty() && value != UNSET
}

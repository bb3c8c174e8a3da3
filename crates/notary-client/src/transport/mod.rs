//! Connections to a ledger node.
//!
//! Every transport speaks JSON-RPC 2.0 and exposes the same single
//! [`JsonRpcTransport::request`] entry point. Middleware and typed helpers
//! live one level up, in [`Provider`](crate::provider::Provider).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{NodeConfig, TransportKind};
use crate::error::{ClientError, ClientResult};
use crate::testnet::InMemoryChain;

pub mod http;
#[cfg(unix)]
pub mod ipc;
pub mod ws;

pub use http::HttpTransport;
#[cfg(unix)]
pub use ipc::IpcTransport;
pub use ws::WsTransport;

/// A JSON-RPC connection to a ledger node.
#[async_trait]
pub trait JsonRpcTransport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Send one request and wait for its matching response. A JSON-RPC error
    /// object becomes [`ClientError::Rpc`].
    async fn request(&self, method: &str, params: Value) -> ClientResult<Value>;
}

/// Open the transport selected by `config`.
pub async fn connect(config: &NodeConfig) -> ClientResult<Arc<dyn JsonRpcTransport>> {
    if config.transport != TransportKind::Test && !config.has_node_address() {
        return Err(ClientError::Transport(format!(
            "node address not configured for {} transport",
            config.transport
        )));
    }

    let transport: Arc<dyn JsonRpcTransport> = match config.transport {
        TransportKind::Test => Arc::new(InMemoryChain::new()),
        TransportKind::Http => Arc::new(HttpTransport::new(&config.node_address)?),
        TransportKind::Websocket => Arc::new(WsTransport::connect(&config.node_address).await?),
        #[cfg(unix)]
        TransportKind::Ipc => Arc::new(IpcTransport::connect(&config.node_address).await?),
        #[cfg(not(unix))]
        TransportKind::Ipc => {
            return Err(ClientError::Transport(
                "ipc transport is only available on unix".into(),
            ))
        }
    };
    Ok(transport)
}

/// Monotonic JSON-RPC request ids, one sequence per connection.
#[derive(Debug, Default)]
pub(crate) struct RequestIds(AtomicU64);

impl RequestIds {
    pub(crate) fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

pub(crate) fn transport_error(context: &str, e: impl std::fmt::Display) -> ClientError {
    ClientError::Transport(format!("{context}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UNSET;

    #[tokio::test]
    async fn missing_address_fails_at_connect() {
        let config = NodeConfig {
            transport: TransportKind::Http,
            node_address: UNSET.into(),
            ..NodeConfig::default()
        };
        let err = connect(&config).await.err().unwrap();
        assert!(matches!(err, ClientError::Transport(msg) if msg.contains("not configured")));
    }

    #[tokio::test]
    async fn test_transport_needs_no_address() {
        let transport = connect(&NodeConfig::test()).await.unwrap();
        assert_eq!(transport.kind(), TransportKind::Test);
    }

    #[test]
    fn ids_start_at_one() {
        let ids = RequestIds::default();
        assert_eq!(ids.next(), 1);
        assert_eq!(ids.next(), 2);
    }
}

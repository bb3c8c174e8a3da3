//! Ledger client for the document notary.
//!
//! [`LedgerClient`] binds to a deployed contract (or deploys one) and
//! exposes three operations with different completion semantics:
//!
//! - `mutate`: submit a transaction and wait, within a bound, until it is mined
//! - `read`: simulate a call against the latest state; no transaction
//! - `deploy`: create a contract instance and bind to it
//!
//! Results come back through the [`normalize`] layer as transport-safe JSON.
//! The node is reached over a [`JsonRpcTransport`] (HTTP, websocket, unix
//! socket, or the in-process [`InMemoryChain`]) wrapped in a [`Provider`]
//! that carries the proof-of-authority header adapter.

pub mod client;
pub mod config;
pub mod error;
pub mod middleware;
pub mod normalize;
pub mod provider;
pub mod rpc;
pub mod testnet;
pub mod transport;

pub use client::{Binding, ClientState, LedgerClient};
pub use config::{MiningConfig, NodeConfig, TransportKind, UNSET};
pub use error::{ClientError, ClientResult};
pub use middleware::{Middleware, MiddlewareOnion, PoaMiddleware};
pub use provider::Provider;
pub use testnet::{InMemoryChain, MiningMode};
pub use transport::JsonRpcTransport;

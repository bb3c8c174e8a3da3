use std::sync::Arc;

use notary_types::{Address, Block, Bytes, TransactionReceipt, TransactionRequest, B256};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::time::{sleep, timeout};
use tracing::debug;

use crate::config::{MiningConfig, TransportKind};
use crate::error::{ClientError, ClientResult};
use crate::middleware::{Middleware, MiddlewareOnion, PoaMiddleware};
use crate::transport::JsonRpcTransport;

/// A transport wrapped in a middleware onion, with typed node calls.
///
/// Every provider carries the proof-of-authority adapter on layer 0.
#[derive(Clone)]
pub struct Provider {
    transport: Arc<dyn JsonRpcTransport>,
    middleware: MiddlewareOnion,
}

impl Provider {
    pub fn new(transport: Arc<dyn JsonRpcTransport>) -> Self {
        let mut middleware = MiddlewareOnion::new();
        middleware.inject(Arc::new(PoaMiddleware), 0);
        Self { transport, middleware }
    }

    pub fn kind(&self) -> TransportKind {
        self.transport.kind()
    }

    pub fn transport(&self) -> &Arc<dyn JsonRpcTransport> {
        &self.transport
    }

    pub fn middleware(&self) -> &MiddlewareOnion {
        &self.middleware
    }

    pub fn inject(&mut self, middleware: Arc<dyn Middleware>, layer: usize) {
        self.middleware.inject(middleware, layer);
    }

    /// Raw request through the middleware onion.
    pub async fn request(&self, method: &str, params: Value) -> ClientResult<Value> {
        let params = self.middleware.process_request(method, params)?;
        let result = self.transport.request(method, params).await?;
        self.middleware.process_response(method, result)
    }

    pub async fn request_as<T: DeserializeOwned>(&self, method: &str, params: Value) -> ClientResult<T> {
        let value = self.request(method, params).await?;
        serde_json::from_value(value)
            .map_err(|e| ClientError::InvalidResponse(format!("{method}: {e}")))
    }

    pub async fn accounts(&self) -> ClientResult<Vec<Address>> {
        self.request_as("eth_accounts", json!([])).await
    }

    /// Submit a transaction for the node to sign and broadcast.
    pub async fn send_transaction(&self, tx: &TransactionRequest) -> ClientResult<B256> {
        self.request_as("eth_sendTransaction", json!([tx]))
            .await
            .map_err(|e| match e {
                ClientError::Rpc { message, .. } => ClientError::TransactionFailure(message),
                other => other,
            })
    }

    pub async fn transaction_receipt(&self, tx_hash: B256) -> ClientResult<Option<TransactionReceipt>> {
        self.request_as("eth_getTransactionReceipt", json!([tx_hash])).await
    }

    /// Simulate `tx` against the latest state.
    pub async fn call(&self, tx: &TransactionRequest) -> ClientResult<Bytes> {
        self.request_as("eth_call", json!([tx, "latest"])).await
    }

    pub async fn latest_block(&self) -> ClientResult<Block> {
        let block: Option<Block> = self
            .request_as("eth_getBlockByNumber", json!(["latest", false]))
            .await?;
        block.ok_or_else(|| ClientError::InvalidResponse("node returned no latest block".into()))
    }

    /// Poll for the receipt of `tx_hash` until it appears or the bound in
    /// `mining` expires.
    pub async fn wait_for_receipt(
        &self,
        tx_hash: B256,
        mining: &MiningConfig,
    ) -> ClientResult<TransactionReceipt> {
        let poll = async {
            let mut attempts = 0u64;
            loop {
                if let Some(receipt) = self.transaction_receipt(tx_hash).await? {
                    debug!(%tx_hash, attempts, "receipt available");
                    return Ok::<_, ClientError>(receipt);
                }
                attempts += 1;
                sleep(mining.poll_interval()).await;
            }
        };
        match timeout(mining.timeout(), poll).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::MiningTimeout {
                tx_hash,
                waited_secs: mining.timeout_secs,
            }),
        }
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("kind", &self.kind())
            .field("middleware", &self.middleware)
            .finish()
    }
}

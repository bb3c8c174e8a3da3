use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use notary_artifact::ArtifactStore;
use notary_client::{ClientError, ClientResult, LedgerClient, NodeConfig};
use notary_types::Address;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::DispatchResult;

/// The two contract operations the dispatcher needs.
#[async_trait]
pub trait ContractBackend: Send + Sync {
    async fn mutate(&self, function: &str, args: &[String]) -> ClientResult<Value>;
    async fn read(&self, function: &str, args: &[String]) -> ClientResult<Value>;
}

#[async_trait]
impl ContractBackend for LedgerClient {
    async fn mutate(&self, function: &str, args: &[String]) -> ClientResult<Value> {
        LedgerClient::mutate(self, function, args).await
    }

    async fn read(&self, function: &str, args: &[String]) -> ClientResult<Value> {
        LedgerClient::read(self, function, args).await
    }
}

/// Produces the backend a request runs against.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> DispatchResult<Arc<dyn ContractBackend>>;
}

type ClientSlot = Arc<RwLock<Option<Arc<LedgerClient>>>>;

/// Connects a [`LedgerClient`] to the configured contract.
///
/// The artifact is looked up by name on first use and the connected client
/// is kept for later requests. A failed connection is not cached, so the
/// next request tries again. A transport failure during a call drops the
/// cached client and the next request reconnects, bound to the same
/// contract address.
pub struct LedgerConnector {
    node: NodeConfig,
    contract_name: String,
    contract_address: Mutex<Option<Address>>,
    store: Arc<dyn ArtifactStore>,
    deploy_if_unbound: bool,
    client: ClientSlot,
}

impl LedgerConnector {
    pub fn new(
        node: NodeConfig,
        contract_name: impl Into<String>,
        contract_address: Option<Address>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            node,
            contract_name: contract_name.into(),
            contract_address: Mutex::new(contract_address),
            store,
            deploy_if_unbound: false,
            client: Arc::new(RwLock::new(None)),
        }
    }

    /// Deploy a fresh contract on first connect when no address is configured.
    pub fn deploy_if_unbound(mut self, deploy: bool) -> Self {
        self.deploy_if_unbound = deploy;
        self
    }

    /// The connected client, if a request has connected one already.
    pub async fn client(&self) -> Option<Arc<LedgerClient>> {
        self.client.read().await.clone()
    }

    /// The configured address, or the one deployed by an earlier connection.
    pub fn contract_address(&self) -> Option<Address> {
        *self
            .contract_address
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn open(&self) -> DispatchResult<Arc<LedgerClient>> {
        let artifact = self.store.load(&self.contract_name)?;
        let mut client =
            LedgerClient::connect(self.node.clone(), self.contract_address(), Some(artifact)).await?;
        if !client.is_bound() && self.deploy_if_unbound {
            let address = client.deploy(None).await?;
            info!(%address, contract = %self.contract_name, "deployed contract for unbound connector");
            *self
                .contract_address
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(address);
        }
        Ok(Arc::new(client))
    }

    fn backend(&self, client: Arc<LedgerClient>) -> Arc<dyn ContractBackend> {
        Arc::new(CachedClient {
            client,
            slot: self.client.clone(),
        })
    }
}

#[async_trait]
impl Connector for LedgerConnector {
    async fn connect(&self) -> DispatchResult<Arc<dyn ContractBackend>> {
        if let Some(client) = self.client.read().await.clone() {
            return Ok(self.backend(client));
        }
        let mut slot = self.client.write().await;
        // another request may have connected while this one waited
        if let Some(client) = slot.clone() {
            return Ok(self.backend(client));
        }
        let client = self.open().await?;
        *slot = Some(client.clone());
        Ok(self.backend(client))
    }
}

/// A cached client that evicts itself when its connection fails.
struct CachedClient {
    client: Arc<LedgerClient>,
    slot: ClientSlot,
}

impl CachedClient {
    async fn check(&self, result: ClientResult<Value>) -> ClientResult<Value> {
        if let Err(ClientError::Transport(reason)) = &result {
            let mut slot = self.slot.write().await;
            if slot.as_ref().is_some_and(|cached| Arc::ptr_eq(cached, &self.client)) {
                warn!(%reason, "ledger connection lost; the next request reconnects");
                *slot = None;
            }
        }
        result
    }
}

#[async_trait]
impl ContractBackend for CachedClient {
    async fn mutate(&self, function: &str, args: &[String]) -> ClientResult<Value> {
        let result = self.client.mutate(function, args).await;
        self.check(result).await
    }

    async fn read(&self, function: &str, args: &[String]) -> ClientResult<Value> {
        let result = self.client.read(function, args).await;
        self.check(result).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::DispatchError;
    use notary_artifact::{ArtifactError, ContractArtifact, InMemoryArtifactStore};
    use serde_json::json;

    pub(crate) fn validator() -> ContractArtifact {
        let abi = json!([
            {"type": "function", "name": "addDocument", "stateMutability": "nonpayable",
             "inputs": [{"name": "user", "type": "string"}, {"name": "hash", "type": "bytes32"}],
             "outputs": []},
            {"type": "function", "name": "validateOne", "stateMutability": "view",
             "inputs": [{"name": "user", "type": "string"}, {"name": "hash", "type": "bytes32"}],
             "outputs": [{"name": "", "type": "bytes32[]"}]}
        ]);
        ContractArtifact::new(
            "Validator",
            serde_json::from_value(abi).unwrap(),
            vec![0x60, 0x80].into(),
        )
    }

    fn store() -> Arc<dyn ArtifactStore> {
        Arc::new(InMemoryArtifactStore::with_artifacts([validator()]))
    }

    #[tokio::test]
    async fn missing_artifact() {
        let connector = LedgerConnector::new(NodeConfig::test(), "Registry", None, store());
        let err = connector.connect().await.err().unwrap();
        assert!(matches!(err, DispatchError::Artifact(ArtifactError::NotFound(_))));
        assert!(connector.client().await.is_none());
    }

    #[tokio::test]
    async fn unbound_without_address() {
        let connector = LedgerConnector::new(NodeConfig::test(), "Validator", None, store());
        let backend = connector.connect().await.unwrap();
        let err = backend.read("validateOne", &[]).await.unwrap_err();
        assert!(matches!(err, ClientError::UnboundContract));
    }

    #[tokio::test]
    async fn deploys_once_and_caches() {
        let connector =
            LedgerConnector::new(NodeConfig::test(), "Validator", None, store()).deploy_if_unbound(true);
        connector.connect().await.unwrap();
        let first = connector.client().await.unwrap();
        assert!(first.contract_address().is_some());
        assert_eq!(connector.contract_address(), first.contract_address());

        connector.connect().await.unwrap();
        assert!(Arc::ptr_eq(&connector.client().await.unwrap(), &first));
    }

    #[tokio::test]
    async fn call_errors_keep_the_connection() {
        let connector =
            LedgerConnector::new(NodeConfig::test(), "Validator", None, store()).deploy_if_unbound(true);
        let backend = connector.connect().await.unwrap();
        let first = connector.client().await.unwrap();
        assert!(backend.read("burnDocument", &[]).await.is_err());
        assert!(Arc::ptr_eq(&connector.client().await.unwrap(), &first));
    }

    #[cfg(unix)]
    mod reconnect {
        use super::*;
        use crate::{ActionRequest, Dispatcher, Status};
        use notary_client::TransportKind;
        use std::path::Path;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{UnixListener, UnixStream};

        const HASH: &str = "0x949e6011110eee750c48cd49e7b1d298ca2e66d42d8aee6dc4623532ffbd996c";

        fn next_request(buf: &mut Vec<u8>) -> Option<Value> {
            let mut stream = serde_json::Deserializer::from_slice(buf).into_iter::<Value>();
            let value = stream.next()?.ok()?;
            let used = stream.byte_offset();
            buf.drain(..used);
            Some(value)
        }

        /// Answers requests on one connection, hanging up after `limit` replies.
        async fn serve(mut sock: UnixStream, limit: Option<usize>) {
            // an empty bytes32[]: offset word then zero length
            let empty_list = format!("0x{:064x}{:064x}", 0x20, 0);
            let mut buf = Vec::new();
            let mut answered = 0;
            loop {
                while let Some(req) = next_request(&mut buf) {
                    let result = match req["method"].as_str() {
                        Some("eth_accounts") => json!(["0x1111111111111111111111111111111111111111"]),
                        Some("eth_call") => json!(empty_list),
                        _ => Value::Null,
                    };
                    let reply = json!({"jsonrpc": "2.0", "id": req["id"], "result": result});
                    if sock.write_all(reply.to_string().as_bytes()).await.is_err() {
                        return;
                    }
                    answered += 1;
                    if limit == Some(answered) {
                        return;
                    }
                }
                let mut chunk = [0u8; 4096];
                match sock.read(&mut chunk).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => buf.extend_from_slice(&chunk[..n]),
                }
            }
        }

        /// A node whose first connection drops after its first reply.
        fn spawn_node(path: &Path) -> Arc<AtomicUsize> {
            let listener = UnixListener::bind(path).unwrap();
            let accepted = Arc::new(AtomicUsize::new(0));
            let count = accepted.clone();
            tokio::spawn(async move {
                while let Ok((sock, _)) = listener.accept().await {
                    let limit = (count.fetch_add(1, Ordering::SeqCst) == 0).then_some(1);
                    tokio::spawn(serve(sock, limit));
                }
            });
            accepted
        }

        #[tokio::test]
        async fn dropped_connection_is_replaced() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("node.ipc");
            let accepted = spawn_node(&path);

            let node = NodeConfig {
                transport: TransportKind::Ipc,
                node_address: path.display().to_string(),
                ..NodeConfig::test()
            };
            let connector = Arc::new(LedgerConnector::new(
                node,
                "Validator",
                Some(Address::repeat_byte(0x22)),
                store(),
            ));
            let dispatcher = Dispatcher::new(connector.clone());
            let request = ActionRequest::new("a@b.com", vec![HASH.to_string()], "validateOne");

            let lost = dispatcher.dispatch(&request).await;
            assert_eq!(lost.status, Status::Error);
            assert!(connector.client().await.is_none());

            for _ in 0..2 {
                let ok = dispatcher.dispatch(&request).await;
                assert_eq!(ok.status, Status::Success);
                assert_eq!(ok.payload, json!([]));
            }
            assert_eq!(accepted.load(Ordering::SeqCst), 2);
            assert_eq!(connector.contract_address(), Some(Address::repeat_byte(0x22)));
        }
    }
}

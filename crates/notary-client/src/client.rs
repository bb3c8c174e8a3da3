use std::sync::Arc;

use notary_abi::{is_read_only, FunctionRegistry};
use notary_artifact::ContractArtifact;
use notary_types::{Address, TransactionRequest};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::NodeConfig;
use crate::error::{ClientError, ClientResult};
use crate::normalize::{normalize_block, normalize_output, normalize_receipt};
use crate::provider::Provider;
use crate::transport::{self, JsonRpcTransport};

/// Whether a client has a contract to talk to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientState {
    /// Only `deploy` is possible.
    Unbound,
    /// Bound to a contract address. Terminal.
    Bound,
}

/// A contract address paired with the interface used to reach it.
#[derive(Clone, Debug)]
pub struct Binding {
    pub address: Address,
    pub artifact: ContractArtifact,
    registry: FunctionRegistry,
}

impl Binding {
    pub fn new(address: Address, artifact: ContractArtifact) -> Self {
        let registry = FunctionRegistry::new(&artifact.interface);
        Self {
            address,
            artifact,
            registry,
        }
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }
}

/// Client for one contract on one ledger node.
///
/// Constructed UNBOUND or BOUND; `deploy` moves an UNBOUND client to BOUND
/// and nothing moves it back. `mutate` and `deploy` submit transactions from
/// the default account and wait for them to be mined; both hold the
/// client's send lock for the whole submit-and-wait so transactions from one
/// client never race for the account nonce. `read` is a simulated call and
/// takes no lock.
pub struct LedgerClient {
    provider: Provider,
    config: NodeConfig,
    default_account: Address,
    binding: Option<Binding>,
    /// Artifact held for a later `deploy`.
    artifact: Option<ContractArtifact>,
    send_lock: Mutex<()>,
}

impl LedgerClient {
    /// Connect to the node described by `config`.
    ///
    /// With both `address` and `artifact` the client starts BOUND; otherwise
    /// it starts UNBOUND and keeps any artifact for `deploy`.
    pub async fn connect(
        config: NodeConfig,
        address: Option<Address>,
        artifact: Option<ContractArtifact>,
    ) -> ClientResult<Self> {
        let transport = transport::connect(&config).await?;
        Self::with_transport(transport, config, address, artifact).await
    }

    /// Build a client over an already open transport.
    pub async fn with_transport(
        transport: Arc<dyn JsonRpcTransport>,
        config: NodeConfig,
        address: Option<Address>,
        artifact: Option<ContractArtifact>,
    ) -> ClientResult<Self> {
        let provider = Provider::new(transport);
        let accounts = provider.accounts().await?;
        let default_account = select_account(&accounts, &config).await?;
        debug!(%default_account, transport = %provider.kind(), "ledger client connected");

        let (binding, artifact) = match (address, artifact) {
            (Some(address), Some(artifact)) => (Some(Binding::new(address, artifact)), None),
            (Some(address), None) => {
                warn!(%address, "contract address given without an artifact; client left unbound");
                (None, None)
            }
            (None, artifact) => (None, artifact),
        };

        Ok(Self {
            provider,
            config,
            default_account,
            binding,
            artifact,
            send_lock: Mutex::new(()),
        })
    }

    pub fn state(&self) -> ClientState {
        if self.binding.is_some() {
            ClientState::Bound
        } else {
            ClientState::Unbound
        }
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn contract_address(&self) -> Option<Address> {
        self.binding.as_ref().map(|b| b.address)
    }

    pub fn binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }

    pub fn default_account(&self) -> Address {
        self.default_account
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    fn bound(&self) -> ClientResult<&Binding> {
        self.binding.as_ref().ok_or(ClientError::UnboundContract)
    }

    /// Bind to an already deployed contract.
    pub fn bind(&mut self, address: Address, artifact: ContractArtifact) -> ClientResult<()> {
        if let Some(existing) = &self.binding {
            return Err(ClientError::AlreadyBound(existing.address));
        }
        self.binding = Some(Binding::new(address, artifact));
        self.artifact = None;
        Ok(())
    }

    /// Invoke a state-changing function and wait for it to be mined.
    ///
    /// Returns the normalized receipt. Each call is a new transaction;
    /// resubmitting after a failure is not a retry of the same one.
    pub async fn mutate(&self, function: &str, args: &[String]) -> ClientResult<Value> {
        let binding = self.bound()?;
        let prepared = binding.registry.prepare(function, args)?;
        if is_read_only(prepared.function) {
            warn!(function, "submitting a transaction to a read-only function");
        }

        let tx = TransactionRequest::call(self.default_account, binding.address, prepared.calldata)
            .with_gas(self.config.gas_limit);

        let _nonce = self.send_lock.lock().await;
        let tx_hash = self.provider.send_transaction(&tx).await?;
        info!(function, %tx_hash, contract = %binding.address, "transaction submitted");
        let receipt = self.provider.wait_for_receipt(tx_hash, &self.config.mining).await?;
        if !receipt.succeeded() {
            return Err(ClientError::Reverted { tx_hash });
        }
        Ok(normalize_receipt(&receipt))
    }

    /// Simulate a function call against the latest state and return its
    /// normalized output. No transaction is created.
    pub async fn read(&self, function: &str, args: &[String]) -> ClientResult<Value> {
        let binding = self.bound()?;
        let prepared = binding.registry.prepare(function, args)?;
        if !is_read_only(prepared.function) {
            debug!(function, "simulating a state-changing function; no state will change");
        }

        let tx = TransactionRequest::call(self.default_account, binding.address, prepared.calldata.clone());
        let data = self.provider.call(&tx).await?;
        let values = prepared.decode_output(&data)?;
        Ok(normalize_output(&values))
    }

    /// Deploy a new contract instance and bind to it.
    ///
    /// Uses `artifact` if given, else the one supplied at construction.
    /// Calling this on a bound client fails; every successful call creates a
    /// distinct contract on the ledger.
    pub async fn deploy(&mut self, artifact: Option<ContractArtifact>) -> ClientResult<Address> {
        self.deploy_with_args(artifact, &[]).await
    }

    /// [`deploy`](Self::deploy) with constructor arguments.
    pub async fn deploy_with_args(
        &mut self,
        artifact: Option<ContractArtifact>,
        args: &[String],
    ) -> ClientResult<Address> {
        if let Some(existing) = &self.binding {
            return Err(ClientError::AlreadyBound(existing.address));
        }
        let artifact = artifact
            .or_else(|| self.artifact.clone())
            .filter(ContractArtifact::is_deployable)
            .ok_or(ClientError::ArtifactMissing)?;

        let data = FunctionRegistry::new(&artifact.interface).encode_deploy(&artifact.bytecode, args)?;
        let tx = TransactionRequest::deploy(self.default_account, data).with_gas(self.config.gas_limit);

        let receipt = {
            let _nonce = self.send_lock.lock().await;
            let tx_hash = self.provider.send_transaction(&tx).await?;
            debug!(%tx_hash, contract = %artifact.name, "deployment submitted");
            let receipt = self.provider.wait_for_receipt(tx_hash, &self.config.mining).await?;
            if !receipt.succeeded() {
                return Err(ClientError::Reverted { tx_hash });
            }
            receipt
        };

        let address = receipt.contract_address.ok_or_else(|| {
            ClientError::InvalidResponse("deployment receipt carries no contract address".into())
        })?;
        info!(%address, contract = %artifact.name, "contract deployed");
        self.binding = Some(Binding::new(address, artifact));
        self.artifact = None;
        Ok(address)
    }

    /// The latest block, normalized.
    pub async fn latest_block(&self) -> ClientResult<Value> {
        let block = self.provider.latest_block().await?;
        Ok(normalize_block(&block))
    }
}

impl std::fmt::Debug for LedgerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerClient")
            .field("transport", &self.provider.kind())
            .field("default_account", &self.default_account)
            .field("contract", &self.contract_address())
            .finish()
    }
}

/// Pick the signing account: the key file's account when one is configured,
/// otherwise the node's first account.
async fn select_account(accounts: &[Address], config: &NodeConfig) -> ClientResult<Address> {
    let first = *accounts.first().ok_or(ClientError::NoAccountsAvailable)?;
    if !config.has_key_file() {
        return Ok(first);
    }

    let key_error = |reason: String| ClientError::KeyFile {
        path: config.key_file.clone(),
        reason,
    };
    let raw = tokio::fs::read_to_string(&config.key_file)
        .await
        .map_err(|e| key_error(e.to_string()))?;
    let keystore: Value = serde_json::from_str(&raw).map_err(|e| key_error(e.to_string()))?;
    let address = keystore
        .get("address")
        .and_then(Value::as_str)
        .ok_or_else(|| key_error("no address field".into()))?
        .parse::<Address>()
        .map_err(|e| key_error(e.to_string()))?;

    if accounts.contains(&address) {
        Ok(address)
    } else {
        Err(ClientError::UnknownAccount(address))
    }
}

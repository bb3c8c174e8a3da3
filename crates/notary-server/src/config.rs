use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use notary_artifact::DEFAULT_ARTIFACT_DIR;
use notary_client::NodeConfig;
use notary_types::Address;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

pub const DEFAULT_CONTRACT_NAME: &str = "Validator";

/// Server settings. Built once at startup and handed to [`NotaryServer`](crate::NotaryServer).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Name of the artifact describing the contract.
    pub contract_name: String,
    /// Address of the deployed contract. Without one, requests fail as
    /// unbound unless `deploy_if_unbound` is set.
    pub contract_address: Option<Address>,
    pub artifacts_dir: PathBuf,
    /// Deploy a fresh contract on the first request when no address is set.
    pub deploy_if_unbound: bool,
    pub node: NodeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080)),
            contract_name: DEFAULT_CONTRACT_NAME.to_string(),
            contract_address: None,
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACT_DIR),
            deploy_if_unbound: false,
            node: NodeConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults with the node section taken from the environment.
    pub fn from_env() -> Self {
        Self {
            node: NodeConfig::from_env(),
            ..Self::default()
        }
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }
}

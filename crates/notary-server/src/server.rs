use std::sync::Arc;

use notary_artifact::FileArtifactStore;
use notary_dispatch::{Dispatcher, LedgerConnector};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Document notary HTTP server.
pub struct NotaryServer {
    config: ServerConfig,
    dispatcher: Dispatcher,
}

impl NotaryServer {
    /// Server over the ledger and artifact directory named in `config`.
    /// Nothing is connected until the first request.
    pub fn new(config: ServerConfig) -> Self {
        let store = Arc::new(FileArtifactStore::new(&config.artifacts_dir));
        let connector = LedgerConnector::new(
            config.node.clone(),
            config.contract_name.clone(),
            config.contract_address,
            store,
        )
        .deploy_if_unbound(config.deploy_if_unbound);
        Self::with_dispatcher(config, Dispatcher::new(Arc::new(connector)))
    }

    pub fn with_dispatcher(config: ServerConfig, dispatcher: Dispatcher) -> Self {
        Self { config, dispatcher }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(AppState::new(
            self.dispatcher.clone(),
            &self.config.contract_name,
            self.config.node.transport.as_str(),
        ))
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            transport = %self.config.node.transport,
            contract = %self.config.contract_name,
            "notary server listening on {}",
            self.config.bind_addr
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_construction() {
        let server = NotaryServer::new(ServerConfig::default());
        assert_eq!(server.config().bind_addr, "0.0.0.0:8080".parse::<std::net::SocketAddr>().unwrap());
    }

    #[test]
    fn router_builds() {
        let server = NotaryServer::new(ServerConfig::default());
        let _router = server.router();
    }
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{transport_error, JsonRpcTransport, RequestIds};
use crate::config::TransportKind;
use crate::error::{ClientError, ClientResult};
use crate::rpc::{RpcRequest, RpcResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-RPC over HTTP POST. Stateless; safe for concurrent use.
pub struct HttpTransport {
    client: Client,
    url: String,
    ids: RequestIds,
}

impl HttpTransport {
    pub fn new(url: &str) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| transport_error("building http client", e))?;
        Ok(Self {
            client,
            url: url.to_string(),
            ids: RequestIds::default(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl JsonRpcTransport for HttpTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Http
    }

    async fn request(&self, method: &str, params: Value) -> ClientResult<Value> {
        let id = self.ids.next();
        debug!(id, method, url = %self.url, "rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&RpcRequest::new(id, method, &params))
            .send()
            .await
            .map_err(|e| transport_error(&self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Transport(format!("{} answered HTTP {status}", self.url)));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("rpc response: {e}")))?;
        body.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    async fn stub_node(Json(body): Json<Value>) -> Json<Value> {
        let id = body["id"].clone();
        match body["method"].as_str() {
            Some("eth_accounts") => Json(json!({
                "jsonrpc": "2.0", "id": id,
                "result": ["0x4a8a51797cde3aac2f7dc5c81c548428056a6d12"]
            })),
            _ => Json(json!({
                "jsonrpc": "2.0", "id": id,
                "error": {"code": -32601, "message": "method not found"}
            })),
        }
    }

    async fn spawn_stub() -> String {
        let app = Router::new().route("/", post(stub_node));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn request_roundtrip() {
        let transport = HttpTransport::new(&spawn_stub().await).unwrap();
        let accounts = transport.request("eth_accounts", json!([])).await.unwrap();
        assert_eq!(accounts[0], "0x4a8a51797cde3aac2f7dc5c81c548428056a6d12");
    }

    #[tokio::test]
    async fn rpc_error_surfaces() {
        let transport = HttpTransport::new(&spawn_stub().await).unwrap();
        let err = transport.request("eth_mining", json!([])).await.unwrap_err();
        assert!(matches!(err, ClientError::Rpc { code: -32601, .. }));
    }

    #[tokio::test]
    async fn unreachable_node_is_transport_error() {
        let transport = HttpTransport::new("http://127.0.0.1:1/").unwrap();
        let err = transport.request("eth_accounts", json!([])).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}

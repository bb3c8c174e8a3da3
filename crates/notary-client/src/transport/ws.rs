use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use super::{transport_error, JsonRpcTransport, RequestIds};
use crate::config::TransportKind;
use crate::error::{ClientError, ClientResult};
use crate::rpc::{RpcRequest, RpcResponse};

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// JSON-RPC over one persistent websocket.
///
/// Requests are serialized on the stream: each caller holds the lock until
/// its own response arrives. Frames answering other ids (subscription
/// notifications, late replies) are skipped.
pub struct WsTransport {
    stream: Mutex<Stream>,
    url: String,
    ids: RequestIds,
}

impl WsTransport {
    pub async fn connect(url: &str) -> ClientResult<Self> {
        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| transport_error(url, e))?;
        debug!(url, "websocket connected");
        Ok(Self {
            stream: Mutex::new(stream),
            url: url.to_string(),
            ids: RequestIds::default(),
        })
    }
}

#[async_trait]
impl JsonRpcTransport for WsTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Websocket
    }

    async fn request(&self, method: &str, params: Value) -> ClientResult<Value> {
        let id = self.ids.next();
        let text = serde_json::to_string(&RpcRequest::new(id, method, &params))?;
        debug!(id, method, url = %self.url, "rpc request");

        let mut stream = self.stream.lock().await;
        stream
            .send(Message::Text(text))
            .await
            .map_err(|e| transport_error(&self.url, e))?;

        loop {
            let frame = match stream.next().await {
                Some(frame) => frame.map_err(|e| transport_error(&self.url, e))?,
                None => return Err(ClientError::Transport(format!("{} closed the stream", self.url))),
            };
            let response: RpcResponse = match frame {
                Message::Text(text) => serde_json::from_str(&text)?,
                Message::Binary(data) => serde_json::from_slice(&data)?,
                Message::Ping(payload) => {
                    stream
                        .send(Message::Pong(payload))
                        .await
                        .map_err(|e| transport_error(&self.url, e))?;
                    continue;
                }
                Message::Close(_) => {
                    return Err(ClientError::Transport(format!("{} closed the stream", self.url)))
                }
                _ => continue,
            };
            if response.answers(id) {
                return response.into_result();
            }
            debug!(expected = id, got = %response.id, "skipping unrelated frame");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::net::TcpListener;

    /// Answers each request with a notification frame first, then the reply.
    async fn spawn_stub() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            while let Some(Ok(Message::Text(text))) = ws.next().await {
                let req: Value = serde_json::from_str(&text).unwrap();
                let notification = json!({"jsonrpc": "2.0", "method": "eth_subscription", "params": {}});
                ws.send(Message::Text(notification.to_string())).await.unwrap();
                let reply = json!({"jsonrpc": "2.0", "id": req["id"], "result": "0x2a"});
                ws.send(Message::Text(reply.to_string())).await.unwrap();
            }
        });
        format!("ws://{addr}")
    }

    #[tokio::test]
    async fn matches_reply_by_id() {
        let transport = WsTransport::connect(&spawn_stub().await).await.unwrap();
        assert_eq!(transport.kind(), TransportKind::Websocket);
        assert_eq!(transport.request("eth_blockNumber", json!([])).await.unwrap(), "0x2a");
        assert_eq!(transport.request("eth_blockNumber", json!([])).await.unwrap(), "0x2a");
    }

    #[tokio::test]
    async fn refused_connection() {
        assert!(WsTransport::connect("ws://127.0.0.1:1").await.is_err());
    }
}

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use tracing::debug;

use super::{transport_error, JsonRpcTransport, RequestIds};
use crate::config::TransportKind;
use crate::error::{ClientError, ClientResult};
use crate::rpc::{RpcRequest, RpcResponse};

struct Connection {
    stream: UnixStream,
    /// Bytes read past the end of the last complete response.
    pending: Vec<u8>,
}

/// JSON-RPC over a local unix socket.
///
/// The socket carries a bare stream of JSON values with no framing, so
/// responses are delimited by parsing.
pub struct IpcTransport {
    conn: Mutex<Connection>,
    path: PathBuf,
    ids: RequestIds,
}

impl IpcTransport {
    pub async fn connect(path: impl Into<PathBuf>) -> ClientResult<Self> {
        let path = path.into();
        let stream = UnixStream::connect(&path)
            .await
            .map_err(|e| transport_error(&path.display().to_string(), e))?;
        debug!(path = %path.display(), "ipc connected");
        Ok(Self {
            conn: Mutex::new(Connection {
                stream,
                pending: Vec::new(),
            }),
            path,
            ids: RequestIds::default(),
        })
    }

    fn io_error(&self, e: impl std::fmt::Display) -> ClientError {
        transport_error(&self.path.display().to_string(), e)
    }
}

/// Pop the first complete JSON value off the front of `pending`.
///
/// Unparseable bytes are discarded along with everything buffered after
/// them, so one bad frame fails one request.
fn take_value(pending: &mut Vec<u8>) -> ClientResult<Option<Value>> {
    let mut values = serde_json::Deserializer::from_slice(pending).into_iter::<Value>();
    match values.next() {
        Some(Ok(value)) => {
            let used = values.byte_offset();
            pending.drain(..used);
            Ok(Some(value))
        }
        Some(Err(e)) if e.is_eof() => Ok(None),
        Some(Err(e)) => {
            pending.clear();
            Err(ClientError::InvalidResponse(e.to_string()))
        }
        None => {
            pending.clear();
            Ok(None)
        }
    }
}

#[async_trait]
impl JsonRpcTransport for IpcTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Ipc
    }

    async fn request(&self, method: &str, params: Value) -> ClientResult<Value> {
        let id = self.ids.next();
        let payload = serde_json::to_vec(&RpcRequest::new(id, method, &params))?;
        debug!(id, method, path = %self.path.display(), "rpc request");

        let mut conn = self.conn.lock().await;
        conn.stream.write_all(&payload).await.map_err(|e| self.io_error(e))?;

        loop {
            while let Some(value) = take_value(&mut conn.pending)? {
                let response: RpcResponse = serde_json::from_value(value)?;
                if response.answers(id) {
                    return response.into_result();
                }
                debug!(expected = id, got = %response.id, "skipping unrelated message");
            }
            let Connection { stream, pending } = &mut *conn;
            let read = stream.read_buf(pending).await.map_err(|e| self.io_error(e))?;
            if read == 0 {
                return Err(ClientError::Transport(format!(
                    "{} closed the connection",
                    self.path.display()
                )));
            }
        }
    }
}

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde_json::Value;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::action::{Action, ActionRequest};
use crate::connector::Connector;
use crate::error::{DispatchError, DispatchResult};
use crate::result::{ActionResult, UNEXPECTED_ACTION};

/// Maps actions onto contract calls.
///
/// The dispatcher is the single recovery boundary: every failure, including
/// a panic inside a contract call, comes back as an error [`ActionResult`].
/// Multi-hash actions run strictly in input order, one call finishing
/// before the next starts.
#[derive(Clone)]
pub struct Dispatcher {
    connector: Arc<dyn Connector>,
}

impl Dispatcher {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    pub async fn dispatch(&self, request: &ActionRequest) -> ActionResult {
        let request_id = Uuid::now_v7();
        let span = tracing::info_span!("dispatch", %request_id, action = %request.action);

        async {
            let action = match request.action.parse::<Action>() {
                Ok(action) => action,
                Err(_) => {
                    warn!("unexpected action");
                    return ActionResult::error(UNEXPECTED_ACTION);
                }
            };

            match AssertUnwindSafe(self.run(action, request)).catch_unwind().await {
                Ok(Ok(payload)) => {
                    info!(hashes = request.hashes.len(), "action completed");
                    ActionResult::success(action.kind(), payload)
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "action failed");
                    ActionResult::error(e.to_string())
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    warn!(panic = %message, "action panicked");
                    ActionResult::error(format!("internal error: {message}"))
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(&self, action: Action, request: &ActionRequest) -> DispatchResult<Value> {
        let first = request.hashes.first().ok_or(DispatchError::NoHashes)?;
        let backend = self.connector.connect().await?;
        let function = action.function();
        let args = |hash: &str| vec![request.user.clone(), hash.to_string()];

        if !action.is_batch() {
            let value = if action.is_mutating() {
                backend.mutate(function, &args(first)).await?
            } else {
                backend.read(function, &args(first)).await?
            };
            return Ok(value);
        }

        let mut results = Vec::with_capacity(request.hashes.len());
        for hash in &request.hashes {
            let value = if action.is_mutating() {
                backend.mutate(function, &args(hash)).await?
            } else {
                backend.read(function, &args(hash)).await?
            };
            results.push(value);
        }
        Ok(Value::Array(results))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

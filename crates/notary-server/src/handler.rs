use axum::extract::{Form, FromRequest, Query, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::response::Json;
use notary_dispatch::{ActionRequest, ActionResult, Envelope};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::state::AppState;

/// Health check handler.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Info handler.
pub async fn info_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": "notary-server",
        "version": env!("CARGO_PKG_VERSION"),
        "contract": state.contract_name,
        "transport": state.transport,
    }))
}

/// Browser forms post the request document as a JSON string in `data`.
/// A GET carries the same field in its query string.
#[derive(Deserialize)]
struct FormPayload {
    data: String,
}

async fn parse_request(req: Request) -> Result<ActionRequest, String> {
    if req.method() == Method::GET {
        let Query(payload) = Query::<FormPayload>::try_from_uri(req.uri()).map_err(|e| e.body_text())?;
        return serde_json::from_str(&payload.data).map_err(|e| e.to_string());
    }

    let is_form = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        let Form(payload) = Form::<FormPayload>::from_request(req, &())
            .await
            .map_err(|e| e.body_text())?;
        serde_json::from_str(&payload.data).map_err(|e| e.to_string())
    } else {
        let Json(request) = Json::<ActionRequest>::from_request(req, &())
            .await
            .map_err(|e| e.body_text())?;
        Ok(request)
    }
}

/// Action endpoint. Always answers with an envelope; failures are reported
/// in its `status` field, not the HTTP status.
pub async fn api_handler(State(state): State<AppState>, req: Request) -> Json<Envelope> {
    let result = match parse_request(req).await {
        Ok(request) => {
            debug!(user = %request.user, action = %request.action, hashes = request.hashes.len(), "api request");
            state.dispatcher.dispatch(&request).await
        }
        Err(reason) => ActionResult::error(format!("invalid request: {reason}")),
    };
    Json(result.into_envelope())
}

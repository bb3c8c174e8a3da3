use std::sync::Arc;

use serde_json::Value;

use crate::error::ClientResult;

/// A layer of request/response processing between the provider and the
/// transport.
///
/// Requests pass through the layers from the outermost inward and responses
/// come back from the innermost outward.
pub trait Middleware: Send + Sync {
    fn name(&self) -> &'static str;

    fn process_request(&self, _method: &str, params: Value) -> ClientResult<Value> {
        Ok(params)
    }

    fn process_response(&self, _method: &str, result: Value) -> ClientResult<Value> {
        Ok(result)
    }
}

/// Ordered middleware layers. Layer 0 is innermost, next to the transport.
#[derive(Clone, Default)]
pub struct MiddlewareOnion {
    layers: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareOnion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer on the outside.
    pub fn add(&mut self, middleware: Arc<dyn Middleware>) {
        self.layers.push(middleware);
    }

    /// Insert a layer at `layer`, clamped to the current depth.
    pub fn inject(&mut self, middleware: Arc<dyn Middleware>, layer: usize) {
        let at = layer.min(self.layers.len());
        self.layers.insert(at, middleware);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|m| m.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn process_request(&self, method: &str, params: Value) -> ClientResult<Value> {
        self.layers
            .iter()
            .rev()
            .try_fold(params, |params, layer| layer.process_request(method, params))
    }

    pub fn process_response(&self, method: &str, result: Value) -> ClientResult<Value> {
        self.layers
            .iter()
            .try_fold(result, |result, layer| layer.process_response(method, result))
    }
}

impl std::fmt::Debug for MiddlewareOnion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Proof-of-authority header adapter.
///
/// PoA networks keep the signer seal in the header's extra-data field, which
/// then runs past the 32 bytes a standard header allows. The field is moved
/// to `proofOfAuthorityData` so block parsing sees a standard header.
#[derive(Clone, Copy, Debug, Default)]
pub struct PoaMiddleware;

impl Middleware for PoaMiddleware {
    fn name(&self) -> &'static str {
        "proof_of_authority"
    }

    fn process_response(&self, method: &str, mut result: Value) -> ClientResult<Value> {
        if matches!(method, "eth_getBlockByNumber" | "eth_getBlockByHash") {
            if let Some(block) = result.as_object_mut() {
                if let Some(extra) = block.remove("extraData") {
                    block.insert("proofOfAuthorityData".to_string(), extra);
                }
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Tag(&'static str);

    impl Middleware for Tag {
        fn name(&self) -> &'static str {
            self.0
        }

        fn process_request(&self, _method: &str, mut params: Value) -> ClientResult<Value> {
            if let Some(list) = params.as_array_mut() {
                list.push(json!(self.0));
            }
            Ok(params)
        }

        fn process_response(&self, _method: &str, mut result: Value) -> ClientResult<Value> {
            if let Some(list) = result.as_array_mut() {
                list.push(json!(self.0));
            }
            Ok(result)
        }
    }

    #[test]
    fn onion_order() {
        let mut onion = MiddlewareOnion::new();
        onion.add(Arc::new(Tag("inner")));
        onion.add(Arc::new(Tag("outer")));
        onion.inject(Arc::new(Tag("core")), 0);
        assert_eq!(onion.names(), vec!["core", "inner", "outer"]);

        let req = onion.process_request("m", json!([])).unwrap();
        assert_eq!(req, json!(["outer", "inner", "core"]));
        let resp = onion.process_response("m", json!([])).unwrap();
        assert_eq!(resp, json!(["core", "inner", "outer"]));
    }

    #[test]
    fn inject_past_end_appends() {
        let mut onion = MiddlewareOnion::new();
        onion.inject(Arc::new(Tag("a")), 5);
        onion.inject(Arc::new(Tag("b")), 5);
        assert_eq!(onion.names(), vec!["a", "b"]);
    }

    #[test]
    fn poa_renames_extra_data_on_blocks() {
        let block = json!({"number": "0x1", "extraData": "0xd883"});
        let out = PoaMiddleware.process_response("eth_getBlockByNumber", block).unwrap();
        assert_eq!(out, json!({"number": "0x1", "proofOfAuthorityData": "0xd883"}));
    }

    #[test]
    fn poa_ignores_other_methods_and_null() {
        let receipt = json!({"extraData": "0x00"});
        let out = PoaMiddleware.process_response("eth_getTransactionReceipt", receipt.clone()).unwrap();
        assert_eq!(out, receipt);
        let missing = PoaMiddleware.process_response("eth_getBlockByHash", Value::Null).unwrap();
        assert_eq!(missing, Value::Null);
    }
}

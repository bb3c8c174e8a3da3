use notary_abi::JsonAbi;
use notary_types::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ArtifactError, ArtifactResult};

/// A compiled contract: its interface description and creation bytecode.
///
/// Serializes to the flat document form `{ "contractName", "abi", "bytecode" }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    #[serde(rename = "contractName", default)]
    pub name: String,
    #[serde(rename = "abi")]
    pub interface: JsonAbi,
    #[serde(default)]
    pub bytecode: Bytes,
}

impl ContractArtifact {
    pub fn new(name: impl Into<String>, interface: JsonAbi, bytecode: Bytes) -> Self {
        Self {
            name: name.into(),
            interface,
            bytecode,
        }
    }

    /// Whether this artifact can be used to create a new contract instance.
    pub fn is_deployable(&self) -> bool {
        !self.bytecode.is_empty()
    }

    /// Extract the artifact for `name` from a stored document.
    ///
    /// Two shapes are understood: the flat form written by
    /// [`to_document`](Self::to_document), and raw solc standard-JSON output,
    /// where every source unit is searched for a contract called `name`.
    pub fn from_document(name: &str, document: &Value) -> ArtifactResult<Self> {
        if document.get("abi").is_some() {
            let mut artifact: Self = serde_json::from_value(document.clone())
                .map_err(|e| malformed(name, e.to_string()))?;
            if artifact.name.is_empty() {
                artifact.name = name.to_string();
            }
            return Ok(artifact);
        }

        let sources = document
            .get("contracts")
            .and_then(Value::as_object)
            .ok_or_else(|| malformed(name, "neither an `abi` nor a `contracts` section"))?;

        let contract = sources
            .values()
            .find_map(|unit| unit.get(name))
            .ok_or_else(|| ArtifactError::NotFound(name.to_string()))?;

        Self::from_solc_contract(name, contract)
    }

    /// Build an artifact from one `contracts.<source>.<name>` entry of solc
    /// standard-JSON output.
    pub fn from_solc_contract(name: &str, contract: &Value) -> ArtifactResult<Self> {
        let abi = match contract.get("abi") {
            Some(abi) => abi.clone(),
            None => {
                // metadata is itself a JSON document, embedded as a string
                let metadata = contract
                    .get("metadata")
                    .and_then(Value::as_str)
                    .ok_or_else(|| malformed(name, "missing `abi` and `metadata`"))?;
                let metadata: Value = serde_json::from_str(metadata)
                    .map_err(|e| malformed(name, format!("metadata: {e}")))?;
                metadata
                    .pointer("/output/abi")
                    .cloned()
                    .ok_or_else(|| malformed(name, "metadata has no output.abi"))?
            }
        };
        let interface: JsonAbi =
            serde_json::from_value(abi).map_err(|e| malformed(name, format!("abi: {e}")))?;

        let object = contract
            .pointer("/evm/bytecode/object")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if object.contains("__") {
            return Err(malformed(name, "bytecode has unlinked library placeholders"));
        }
        let bytecode: Bytes = object
            .parse()
            .map_err(|e| malformed(name, format!("bytecode: {e}")))?;

        Ok(Self::new(name, interface, bytecode))
    }

    pub fn to_document(&self) -> ArtifactResult<Value> {
        serde_json::to_value(self).map_err(|e| ArtifactError::Serialization(e.to_string()))
    }
}

fn malformed(name: &str, reason: impl Into<String>) -> ArtifactError {
    ArtifactError::Malformed {
        name: name.to_string(),
        reason: reason.into(),
    }
}

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::artifact::ContractArtifact;
use crate::error::{ArtifactError, ArtifactResult};
use crate::traits::{validate_name, ArtifactStore};

/// In-memory artifact store for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    artifacts: RwLock<HashMap<String, ContractArtifact>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the given artifacts, keyed by their names.
    pub fn with_artifacts(artifacts: impl IntoIterator<Item = ContractArtifact>) -> Self {
        let map = artifacts
            .into_iter()
            .map(|artifact| (artifact.name.clone(), artifact))
            .collect();
        Self {
            artifacts: RwLock::new(map),
        }
    }

    pub fn len(&self) -> usize {
        self.artifacts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn load(&self, name: &str) -> ArtifactResult<ContractArtifact> {
        let name = validate_name(name)?;
        self.artifacts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| ArtifactError::NotFound(name.to_string()))
    }

    fn save(&self, name: &str, artifact: &ContractArtifact) -> ArtifactResult<()> {
        let name = validate_name(name)?;
        let mut artifact = artifact.clone();
        artifact.name = name.to_string();
        self.artifacts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), artifact);
        Ok(())
    }

    fn exists(&self, name: &str) -> ArtifactResult<bool> {
        let name = validate_name(name)?;
        Ok(self
            .artifacts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name))
    }
}

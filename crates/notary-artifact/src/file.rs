use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::artifact::ContractArtifact;
use crate::error::{ArtifactError, ArtifactResult};
use crate::traits::{validate_name, ArtifactStore};

/// Default location of compiled artifacts, relative to the working directory.
pub const DEFAULT_ARTIFACT_DIR: &str = "contracts/json";

/// Directory of `<name>.json` artifact documents.
#[derive(Clone, Debug)]
pub struct FileArtifactStore {
    root: PathBuf,
}

impl FileArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, name: &str) -> ArtifactResult<PathBuf> {
        let name = validate_name(name)?;
        Ok(self.root.join(format!("{name}.json")))
    }

    /// Write a raw document (for example solc output) under `name` without
    /// interpreting it.
    pub fn save_document(&self, name: &str, document: &Value) -> ArtifactResult<PathBuf> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.root)?;
        let json = serde_json::to_vec_pretty(document)
            .map_err(|e| ArtifactError::Serialization(e.to_string()))?;
        // write then rename so a concurrent reader never sees a partial file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), "artifact written");
        Ok(path)
    }
}

impl Default for FileArtifactStore {
    fn default() -> Self {
        Self::new(DEFAULT_ARTIFACT_DIR)
    }
}

impl ArtifactStore for FileArtifactStore {
    fn load(&self, name: &str) -> ArtifactResult<ContractArtifact> {
        let path = self.path_for(name)?;
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ArtifactError::NotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let document: Value = serde_json::from_slice(&raw).map_err(|e| ArtifactError::Malformed {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), "artifact loaded");
        ContractArtifact::from_document(validate_name(name)?, &document)
    }

    fn save(&self, name: &str, artifact: &ContractArtifact) -> ArtifactResult<()> {
        let mut artifact = artifact.clone();
        artifact.name = validate_name(name)?.to_string();
        self.save_document(name, &artifact.to_document()?)?;
        Ok(())
    }

    fn exists(&self, name: &str) -> ArtifactResult<bool> {
        Ok(self.path_for(name)?.is_file())
    }
}

use crate::artifact::ContractArtifact;
use crate::error::{ArtifactError, ArtifactResult};

/// Named storage for compiled contract artifacts.
///
/// Artifacts are build outputs: written rarely by a compile step, read on
/// every request. No concurrency control beyond what the backend gives for
/// free is expected.
pub trait ArtifactStore: Send + Sync {
    /// Load the artifact stored under `name`.
    ///
    /// Fails with [`ArtifactError::NotFound`] when nothing is stored there
    /// and [`ArtifactError::NoContractName`] when `name` is empty.
    fn load(&self, name: &str) -> ArtifactResult<ContractArtifact>;

    /// Store `artifact` under `name`, replacing any previous version.
    fn save(&self, name: &str, artifact: &ContractArtifact) -> ArtifactResult<()>;

    fn exists(&self, name: &str) -> ArtifactResult<bool>;
}

/// Reject names that are empty or could escape the store's namespace.
pub fn validate_name(name: &str) -> ArtifactResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ArtifactError::NoContractName);
    }
    if trimmed.contains(['/', '\\']) || trimmed.starts_with('.') {
        return Err(ArtifactError::InvalidName(name.to_string()));
    }
    Ok(trimmed)
}

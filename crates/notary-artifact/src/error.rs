/// Errors from artifact loading, saving, and compilation.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// No compiled artifact exists under the requested name.
    #[error("no compiled artifact found for contract {0:?}")]
    NotFound(String),

    /// A contract name is required but none was given.
    #[error("no contract name given")]
    NoContractName,

    /// The name cannot be used as a storage key.
    #[error("invalid contract name {0:?}")]
    InvalidName(String),

    /// The stored document does not have the expected shape.
    #[error("malformed artifact {name:?}: {reason}")]
    Malformed { name: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    /// The Solidity compiler failed or reported errors.
    #[error("compiler error: {0}")]
    Compiler(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ArtifactResult<T> = Result<T, ArtifactError>;

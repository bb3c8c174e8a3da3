//! Compiled contract artifacts.
//!
//! An artifact pairs a contract's interface description with its creation
//! bytecode. Artifacts are produced by a compile step ([`SolcCompiler`]) and
//! looked up by contract name through an [`ArtifactStore`]:
//!
//! - [`FileArtifactStore`]: one JSON document per contract in a directory
//! - [`InMemoryArtifactStore`]: for tests and embedding

pub mod artifact;
pub mod compile;
pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use artifact::ContractArtifact;
pub use compile::{SolcCompiler, DEFAULT_SOURCE_DIR};
pub use error::{ArtifactError, ArtifactResult};
pub use file::{FileArtifactStore, DEFAULT_ARTIFACT_DIR};
pub use memory::InMemoryArtifactStore;
pub use traits::{validate_name, ArtifactStore};

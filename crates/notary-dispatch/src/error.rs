use notary_artifact::ArtifactError;
use notary_client::ClientError;

/// Errors raised while dispatching an action. None of them leave
/// [`Dispatcher::dispatch`](crate::Dispatcher::dispatch); each becomes an
/// error result.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("unknown action {0:?}")]
    UnknownAction(String),

    #[error("no hashes supplied")]
    NoHashes,
}

pub type DispatchResult<T> = Result<T, DispatchError>;

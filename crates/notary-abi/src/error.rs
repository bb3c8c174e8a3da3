/// Errors produced while resolving, encoding, or decoding contract calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("{function} expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid argument {index} for {function}: {reason}")]
    InvalidArgument {
        function: String,
        index: usize,
        reason: String,
    },

    #[error("unsupported parameter type: {0}")]
    UnsupportedType(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("malformed interface description: {0}")]
    MalformedInterface(String),
}

pub type AbiResult<T> = Result<T, AbiError>;

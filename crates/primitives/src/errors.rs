use thiserror::Error;

/// Errors decoding or validating a commitment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitmentError {
    /// (type, expected, actual)
    #[error("invalid commitment length for type {0} (expected {1}, got {2})")]
    InvalidLength(u8, usize, usize),

    #[error("unknown commitment type {0}")]
    UnknownType(u8),

    #[error("empty commitment")]
    Empty,

    #[error("missing derivation version byte")]
    MissingTxDataVersion,

    #[error("wrong derivation version byte {0:#04x}")]
    WrongTxDataVersion(u8),
}

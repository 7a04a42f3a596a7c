use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("preimage not found")]
    NotFound,

    #[error("request timed out")]
    Timeout,

    #[error("transport: {0}")]
    Transport(String),

    /// The service returned data that doesn't hash to the commitment.
    #[error("preimage does not match commitment")]
    InvalidPreimage,
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }
}
